//! # 磁盘数据结构层
//!
//! sfs 的磁盘布局：
//! 超级块 | inode 区域（共 ceil(总块数 / 10) 块） | 数据块区域
//!
//! 数据块区域里的块要么存放文件数据，要么作为某个 inode 独占的间接索引块。
//! 空闲块位图不落盘，每次挂载时由 inode 区域扫描得出。

mod super_block;
pub use super_block::SuperBlock;

mod inode;
pub use inode::{DiskInode, IndirectBlock, InodeBlock, InodeId, Slot};

mod bitmap;
pub use bitmap::Bitmap;

#[cfg(test)]
mod tests {
    use core::mem;

    use super::*;
    use crate::{BLOCK_SIZE, INODES_PER_BLOCK, POINTERS_PER_BLOCK};

    #[test]
    fn layout() {
        assert_eq!(16, mem::size_of::<SuperBlock>());
        assert_eq!(32, mem::size_of::<DiskInode>());
        assert_eq!(BLOCK_SIZE, mem::size_of::<DiskInode>() * INODES_PER_BLOCK);
        assert_eq!(BLOCK_SIZE, mem::size_of::<InodeBlock>());
        assert_eq!(BLOCK_SIZE, mem::size_of::<IndirectBlock>());
        assert_eq!(1024, POINTERS_PER_BLOCK);
    }
}
