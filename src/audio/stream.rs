// Audio stream - ordered sequence of equal-size sample blocks
//
// The synth generator writes into a stream and extends it on demand.
// Blocks are owned by the stream; the generator only ever writes into
// them, it never shrinks the stream.

use crate::audio::format::{SampleBlock, SampleFormat};
use serde::{Deserialize, Serialize};

/// Stream geometry shared by all blocks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub samplerate: u32,
    pub buffer_size: usize,
    pub format: SampleFormat,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            samplerate: 44100,
            buffer_size: 1024,
            format: SampleFormat::F32,
        }
    }
}

/// A growable sequence of fixed-size sample blocks plus loop metadata
#[derive(Debug, Clone)]
pub struct AudioStream {
    config: StreamConfig,
    blocks: Vec<SampleBlock>,
    pub loop_start: u64,
    pub loop_end: u64,
    pub last_frame: u64,
}

impl AudioStream {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            blocks: Vec::new(),
            loop_start: 0,
            loop_end: 0,
            last_frame: 0,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn samplerate(&self) -> u32 {
        self.config.samplerate
    }

    pub fn buffer_size(&self) -> usize {
        self.config.buffer_size
    }

    pub fn format(&self) -> SampleFormat {
        self.config.format
    }

    /// Number of blocks currently allocated.
    pub fn length(&self) -> usize {
        self.blocks.len()
    }

    /// Total frame capacity across all blocks.
    pub fn frame_count(&self) -> usize {
        self.blocks.len() * self.config.buffer_size
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append one zero-filled block.
    pub fn append_block(&mut self) {
        self.blocks.push(SampleBlock::zeroed(
            self.config.format,
            self.config.buffer_size,
        ));
    }

    /// Grow the stream to at least `n` blocks. Existing blocks are kept.
    pub fn resize_blocks(&mut self, n: usize) {
        while self.blocks.len() < n {
            self.append_block();
        }
    }

    pub fn nth_block(&self, index: usize) -> Option<&SampleBlock> {
        self.blocks.get(index)
    }

    pub fn nth_block_mut(&mut self, index: usize) -> Option<&mut SampleBlock> {
        self.blocks.get_mut(index)
    }

    /// Zero all blocks, keeping the allocation.
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            block.clear();
        }
    }
}

impl Default for AudioStream {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> StreamConfig {
        StreamConfig {
            samplerate: 44100,
            buffer_size: 4,
            format: SampleFormat::F64,
        }
    }

    #[test]
    fn test_empty_stream() {
        let stream = AudioStream::new(small_config());
        assert_eq!(stream.length(), 0);
        assert_eq!(stream.frame_count(), 0);
        assert!(stream.nth_block(0).is_none());
    }

    #[test]
    fn test_append_and_resize() {
        let mut stream = AudioStream::new(small_config());
        stream.append_block();
        assert_eq!(stream.length(), 1);
        assert_eq!(stream.frame_count(), 4);

        stream.resize_blocks(3);
        assert_eq!(stream.length(), 3);
        assert_eq!(stream.frame_count(), 12);

        // resize never shrinks
        stream.resize_blocks(1);
        assert_eq!(stream.length(), 3);
    }

    #[test]
    fn test_blocks_match_configured_format() {
        let mut stream = AudioStream::new(small_config());
        stream.append_block();
        assert_eq!(stream.nth_block(0).unwrap().format(), SampleFormat::F64);
        assert_eq!(stream.nth_block(0).unwrap().len(), 4);
    }

    #[test]
    fn test_clear_keeps_length() {
        let mut stream = AudioStream::new(small_config());
        stream.resize_blocks(2);
        if let Some(SampleBlock::F64(v)) = stream.nth_block_mut(0) {
            v[0] = 1.0;
        }
        stream.clear();
        assert_eq!(stream.length(), 2);
        if let Some(SampleBlock::F64(v)) = stream.nth_block(0) {
            assert_eq!(v[0], 0.0);
        }
    }
}
