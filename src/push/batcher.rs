//! Splits recipient lists into provider-sized batches.

/// Partition `items` into contiguous batches of at most `chunk_size`.
///
/// Batches borrow from the input, keep input order and cover it exactly.
/// An empty input yields no batches. A `chunk_size` of zero is treated as one.
pub fn slice_devices<T>(items: &[T], chunk_size: usize) -> Vec<&[T]> {
    items.chunks(chunk_size.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::Device;

    #[test]
    fn test_oversized_input_split() {
        let devices: Vec<u32> = (0..25_000).collect();
        let batches = slice_devices(&devices, 10_000);

        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![10_000, 10_000, 5_000]);
        assert_eq!(batches[1][0], 10_000);
        assert_eq!(batches[2][4_999], 24_999);
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        let devices: Vec<u32> = (0..17).collect();
        for chunk_size in 1..=20 {
            let rebuilt: Vec<u32> = slice_devices(&devices, chunk_size).concat();
            assert_eq!(rebuilt, devices, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn test_empty_input_has_no_batches() {
        let devices: Vec<Device> = Vec::new();
        assert!(slice_devices(&devices, 10).is_empty());
    }

    #[test]
    fn test_small_input_single_batch() {
        let devices = vec![Device::new("a"), Device::new("b")];
        let batches = slice_devices(&devices, 10_000);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], devices.as_slice());
    }

    #[test]
    fn test_no_empty_batches() {
        let devices: Vec<u32> = (0..10).collect();
        assert!(slice_devices(&devices, 5).iter().all(|b| !b.is_empty()));
        assert_eq!(slice_devices(&devices, 0).len(), 10);
    }
}
