//! Intensity traces of fixed regions across channels and frames.

use std::io::Write;

use ndarray::{Array3, ArrayView1, s};

use crate::error::VolumeError;
use crate::volume::{ImageVolume, Region};

/// Dense mean intensities indexed by (region, channel, frame).
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityTable {
    values: Array3<f64>,
}

impl IntensityTable {
    /// `(regions, channels, frames)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, region: usize, channel: usize, frame: usize) -> Option<f64> {
        self.values.get((region, channel, frame)).copied()
    }

    /// Time series of one region in one channel.
    pub fn trace(&self, region: usize, channel: usize) -> ArrayView1<'_, f64> {
        self.values.slice(s![region, channel, ..])
    }

    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Write one row per (region, channel) pair and one column per frame,
    /// tab-separated, with a header row.
    pub fn write_tsv<W: Write>(&self, out: W) -> csv::Result<()> {
        let (regions, channels, frames) = self.dim();
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(out);

        let header =
            std::iter::once("Trace".to_string()).chain((0..frames).map(|t| format!("Frame {}", t)));
        writer.write_record(header)?;
        for r in 0..regions {
            for c in 0..channels {
                let label = format!("Cell {} Channel {}", r, c);
                let values = self.trace(r, c).iter().map(|v| v.to_string()).collect::<Vec<_>>();
                let row = std::iter::once(label).chain(values);
                writer.write_record(row)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// Mean intensity of every region in every channel and frame.
///
/// Each region is sampled at its own depth with its outline held fixed over
/// all frames; its anchor frame and channel do not restrict sampling. Any
/// unreadable plane aborts the extraction.
pub fn extract_traces(
    volume: &dyn ImageVolume,
    regions: &[Region],
) -> Result<IntensityTable, VolumeError> {
    let dims = volume.dims();
    let mut values = Array3::zeros((regions.len(), dims.channels, dims.frames));

    for (r, region) in regions.iter().enumerate() {
        for c in 0..dims.channels {
            for t in 0..dims.frames {
                values[[r, c, t]] = volume.mean_intensity(c, region.depth, t, &region.shape)?;
            }
        }
    }

    tracing::debug!(
        regions = regions.len(),
        channels = dims.channels,
        frames = dims.frames,
        "extracted traces"
    );
    Ok(IntensityTable { values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{Shape, StackVolume, VolumeDims};

    fn volume() -> StackVolume {
        StackVolume::from_fn(VolumeDims::new(2, 2, 3, 8, 8), |c, z, t, _, col| {
            (c * 1000 + z * 100 + t * 10 + col) as f32
        })
    }

    #[test]
    fn test_table_is_complete() {
        let regions = vec![
            Region::at(Shape::rectangle(0.0, 0.0, 2.0, 2.0), 0, 0),
            Region::at(Shape::disk(4.0, 4.0, 1.5), 1, 2),
            Region::at(Shape::polygon(&[(1.0, 1.0), (6.0, 1.0), (6.0, 6.0)]), 0, 1),
        ];
        let table = extract_traces(&volume(), &regions).unwrap();
        assert_eq!(table.dim(), (3, 2, 3));
        assert_eq!(table.values().len(), 3 * 2 * 3);
        assert!(table.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fixed_shape_and_region_depth() {
        let regions = vec![Region::new(Shape::rectangle(2.0, 0.0, 2.0, 1.0), Some(0), 1, 2)];
        let table = extract_traces(&volume(), &regions).unwrap();
        // cols 2 and 3 -> mean col offset 2.5
        assert_eq!(table.get(0, 0, 0), Some(102.5));
        assert_eq!(table.get(0, 0, 1), Some(112.5));
        assert_eq!(table.get(0, 1, 2), Some(1122.5));
    }

    #[test]
    fn test_no_regions_or_frames() {
        let table = extract_traces(&volume(), &[]).unwrap();
        assert!(table.is_empty());

        let empty = StackVolume::zeros(VolumeDims::new(0, 1, 0, 4, 4));
        let regions = vec![Region::at(Shape::disk(1.0, 1.0, 1.0), 0, 0)];
        let table = extract_traces(&empty, &regions).unwrap();
        assert_eq!(table.dim(), (1, 0, 0));
    }

    #[test]
    fn test_bad_depth_aborts() {
        let regions = vec![
            Region::at(Shape::disk(1.0, 1.0, 1.0), 0, 0),
            Region::at(Shape::disk(1.0, 1.0, 1.0), 7, 0),
        ];
        let err = extract_traces(&volume(), &regions).unwrap_err();
        assert!(matches!(err, VolumeError::PlaneOutOfRange { depth: 7, .. }));
    }

    #[test]
    fn test_write_tsv_layout() {
        let regions = vec![Region::at(Shape::rectangle(0.0, 0.0, 1.0, 1.0), 0, 0)];
        let table = extract_traces(&volume(), &regions).unwrap();
        let mut buf = Vec::new();
        table.write_tsv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 2);
        assert_eq!(lines[0], "Trace\tFrame 0\tFrame 1\tFrame 2");
        assert_eq!(lines[1], "Cell 0 Channel 0\t0\t10\t20");
        assert!(lines[2].starts_with("Cell 0 Channel 1\t1000"));
    }
}
