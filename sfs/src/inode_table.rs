//! # inode 表
//!
//! 对 inode 存储的唯一访问途径：每次只读出或改写 inode 所在的那一块，
//! 改写后立即落盘。

use alloc::sync::Arc;

use block_dev::BlockDevice;

use crate::block::Block;
use crate::layout::{DiskInode, InodeId};

pub fn load(id: InodeId, block_device: &Arc<dyn BlockDevice>) -> DiskInode {
    let (block_id, block_offset) = id.disk_pos();
    Block::load(block_id, block_device).map(block_offset, |disk_inode: &DiskInode| *disk_inode)
}

pub fn save(id: InodeId, inode: &DiskInode, block_device: &Arc<dyn BlockDevice>) {
    let (block_id, block_offset) = id.disk_pos();
    let mut block = Block::load(block_id, block_device);
    block.map_mut(block_offset, |disk_inode: &mut DiskInode| *disk_inode = *inode);
    block.store(block_id, block_device);
}
