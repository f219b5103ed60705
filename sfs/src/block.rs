//! # 块缓冲层
//!
//! 把一个磁盘块整块复制到内存，再按需解释为超级块、inode 数组、
//! 间接索引块或原始数据。
//!
//! 这里**没有缓存**：[`Block::load`] 每次都读设备，[`Block::store`]
//! 立即写回设备，对 inode 的任何修改一经写回即落盘。

use alloc::sync::Arc;
use core::mem;

use block_dev::BlockDevice;

use crate::{BLOCK_SIZE, DataBlock};

/// 内存中的一个磁盘块。
/// 按 8 字节对齐，以便直接解释为 `u32` 数组等结构。
#[repr(C, align(8))]
pub struct Block {
    data: DataBlock,
}

impl Block {
    #[inline]
    pub fn zeroed() -> Self {
        Self {
            data: [0; BLOCK_SIZE],
        }
    }

    pub fn load(block_id: usize, block_device: &Arc<dyn BlockDevice>) -> Self {
        let mut block = Self::zeroed();
        block_device.read_block(block_id, &mut block.data);
        block
    }

    #[inline]
    pub fn store(&self, block_id: usize, block_device: &Arc<dyn BlockDevice>) {
        block_device.write_block(block_id, &self.data);
    }

    #[inline]
    pub fn bytes(&self) -> &DataBlock {
        &self.data
    }

    #[inline]
    pub fn bytes_mut(&mut self) -> &mut DataBlock {
        &mut self.data
    }

    /// `T` 必须是任意位模式皆合法的 `#[repr(C)]` 结构
    pub fn get<T: Sized>(&self, offset: usize) -> &T {
        Self::check::<T>(offset);
        let addr = self.data[offset..].as_ptr().cast::<T>();
        unsafe { &*addr }
    }

    pub fn get_mut<T: Sized>(&mut self, offset: usize) -> &mut T {
        Self::check::<T>(offset);
        let addr = self.data[offset..].as_mut_ptr().cast::<T>();
        unsafe { &mut *addr }
    }

    #[inline]
    pub fn map<T: Sized, V>(&self, offset: usize, f: impl FnOnce(&T) -> V) -> V {
        f(self.get(offset))
    }

    #[inline]
    pub fn map_mut<T: Sized, V>(&mut self, offset: usize, f: impl FnOnce(&mut T) -> V) -> V {
        f(self.get_mut(offset))
    }
}

impl Block {
    #[inline]
    fn check<T>(offset: usize) {
        assert!(mem::size_of::<T>() + offset <= BLOCK_SIZE);
        assert!(mem::align_of::<T>() <= mem::align_of::<Self>());
        assert_eq!(offset % mem::align_of::<T>(), 0);
    }
}
