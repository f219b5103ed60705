//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 块大小由上层文件系统约定，驱动只负责整块搬运。
//! 单次整块读写视为原子操作，且不会失败。

#![no_std]

extern crate alloc;

mod mem_disk;
pub use mem_disk::MemDisk;

use core::any::Any;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    /// 设备的总块数
    fn block_count(&self) -> usize;
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);
}
