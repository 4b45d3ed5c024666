//! Buffer sizing presets.
//!
//! Sockets read from the network in chunks of `read_buf_size` and encode
//! outgoing frames into a buffer that starts at `write_buf_size`. Small
//! buffers suit ping-pong request/reply traffic; large ones suit bulk
//! streaming of multi-kilobyte messages.

use crate::options::SocketOptions;

pub const DEFAULT_READ_BUF_SIZE: usize = 8192;
pub const DEFAULT_WRITE_BUF_SIZE: usize = 8192;

pub const SMALL_READ_BUF_SIZE: usize = 4096;
pub const SMALL_WRITE_BUF_SIZE: usize = 4096;

pub const LARGE_READ_BUF_SIZE: usize = 16384;
pub const LARGE_WRITE_BUF_SIZE: usize = 16384;

/// Read/write buffer sizes for a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    pub read_buf_size: usize,
    pub write_buf_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            read_buf_size: DEFAULT_READ_BUF_SIZE,
            write_buf_size: DEFAULT_WRITE_BUF_SIZE,
        }
    }
}

impl BufferConfig {
    /// For messages under 1KB.
    #[must_use]
    pub const fn small() -> Self {
        Self {
            read_buf_size: SMALL_READ_BUF_SIZE,
            write_buf_size: SMALL_WRITE_BUF_SIZE,
        }
    }

    /// For messages of 8-16KB.
    #[must_use]
    pub const fn large() -> Self {
        Self {
            read_buf_size: LARGE_READ_BUF_SIZE,
            write_buf_size: LARGE_WRITE_BUF_SIZE,
        }
    }

    /// Sizes of zero are raised to one byte.
    #[must_use]
    pub fn custom(read_buf_size: usize, write_buf_size: usize) -> Self {
        Self {
            read_buf_size: read_buf_size.max(1),
            write_buf_size: write_buf_size.max(1),
        }
    }

    /// Sizes currently configured on `options`.
    #[must_use]
    pub fn from_options(options: &SocketOptions) -> Self {
        Self::custom(options.read_buffer_size, options.write_buffer_size)
    }
}

impl SocketOptions {
    /// Apply a buffer preset.
    ///
    /// ```
    /// use tessera_core::config::BufferConfig;
    /// use tessera_core::options::SocketOptions;
    ///
    /// let opts = SocketOptions::new().with_buffer_config(BufferConfig::small());
    /// assert_eq!(opts.read_buffer_size, 4096);
    /// ```
    #[must_use]
    pub fn with_buffer_config(self, config: BufferConfig) -> Self {
        self.with_buffer_sizes(config.read_buf_size, config.write_buf_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(BufferConfig::default().read_buf_size, 8192);
        assert_eq!(BufferConfig::small().write_buf_size, 4096);
        assert_eq!(BufferConfig::large().read_buf_size, 16384);
        assert_eq!(BufferConfig::custom(0, 0), BufferConfig::custom(1, 1));
    }

    #[test]
    fn round_trips_through_options() {
        let opts = SocketOptions::new().with_buffer_config(BufferConfig::large());
        assert_eq!(BufferConfig::from_options(&opts), BufferConfig::large());
        assert_eq!(
            BufferConfig::from_options(&SocketOptions::default()),
            BufferConfig::default()
        );
    }
}
