//! 内存盘：以一段连续内存模拟块设备

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::Mutex;

use crate::BlockDevice;

pub struct MemDisk {
    data: Mutex<Vec<u8>>,
    block_size: usize,
    /// 整块读次数
    reads: AtomicUsize,
    /// 整块写次数
    writes: AtomicUsize,
}

impl MemDisk {
    /// 创建 `blocks` 块、每块 `block_size` 字节的全零内存盘
    pub fn new(blocks: usize, block_size: usize) -> Self {
        assert_ne!(block_size, 0, "block size must not be zero");

        Self {
            data: Mutex::new(vec![0; blocks * block_size]),
            block_size,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// 读写计数清零
    pub fn reset_counters(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
    }
}

impl BlockDevice for MemDisk {
    fn block_count(&self) -> usize {
        self.data.lock().len() / self.block_size
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        assert_eq!(buf.len(), self.block_size, "not a complete block!");
        let data = self.data.lock();
        let start = block_id * self.block_size;
        buf.copy_from_slice(&data[start..start + self.block_size]);
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        assert_eq!(buf.len(), self.block_size, "not a complete block!");
        let mut data = self.data.lock();
        let start = block_id * self.block_size;
        data[start..start + self.block_size].copy_from_slice(buf);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for MemDisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemDisk")
            .field("blocks", &self.block_count())
            .field("block_size", &self.block_size)
            .field("reads", &self.reads())
            .field("writes", &self.writes())
            .finish()
    }
}
