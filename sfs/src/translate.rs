//! # 地址翻译
//!
//! 逻辑上 inode 指向一系列数据块：前 5 块由直接索引给出，
//! 之后的至多 1024 块由间接索引块给出。
//! 此处把这些数据块的索引（逻辑索引）翻译为磁盘上的块ID。
//!
//! 一次读写调用内，间接索引块至多读入一次，随 [`Translator`] 一同丢弃。
//! 不在数据块区域内的索引一律视为未设置。

use alloc::sync::Arc;

use block_dev::BlockDevice;

use crate::block::Block;
use crate::layout::{Bitmap, DiskInode, IndirectBlock, Slot};
use crate::{FsError, Geometry, Result};

pub struct Translator<'a> {
    inode: DiskInode,
    geometry: Geometry,
    /// 已读入的间接索引块
    indirect: Option<Block>,
    block_device: &'a Arc<dyn BlockDevice>,
}

impl<'a> Translator<'a> {
    #[inline]
    pub fn new(
        inode: DiskInode,
        geometry: Geometry,
        block_device: &'a Arc<dyn BlockDevice>,
    ) -> Self {
        Self {
            inode,
            geometry,
            indirect: None,
            block_device,
        }
    }

    #[inline]
    pub fn inode(&self) -> &DiskInode {
        &self.inode
    }

    #[inline]
    pub fn inode_mut(&mut self) -> &mut DiskInode {
        &mut self.inode
    }

    /// 逻辑块对应的块ID，0 表示该块尚未分配
    pub fn get(&mut self, block_index: usize) -> u32 {
        match Slot::of(block_index) {
            Some(Slot::Direct(index)) => self.checked(self.inode.direct[index]),
            Some(Slot::Indirect(index)) if self.checked(self.inode.indirect) != 0 => {
                let block_id = self
                    .indirect_block()
                    .map(0, |indirect: &IndirectBlock| indirect[index]);
                self.checked(block_id)
            }
            _ => 0,
        }
    }

    /// 逻辑块对应的块ID；尚未分配时从位图申请新块并登记到索引中。
    ///
    /// 第二项为 `true` 表示新分配的块，其内容应视为全零。
    /// 需要新建间接索引块时，它会先被清零写回。
    /// 数据块区域外的旧索引被新分配的块取代。
    pub fn get_or_alloc(&mut self, block_index: usize, bitmap: &mut Bitmap) -> Result<(u32, bool)> {
        // 超出最大文件大小的部分同样无块可用
        let slot = Slot::of(block_index).ok_or(FsError::NoFreeBlock)?;

        match slot {
            Slot::Direct(index) => {
                let block_id = self.checked(self.inode.direct[index]);
                if block_id != 0 {
                    return Ok((block_id, false));
                }

                let block_id = alloc(bitmap)?;
                self.inode.direct[index] = block_id;
                Ok((block_id, true))
            }
            Slot::Indirect(index) => {
                if self.checked(self.inode.indirect) == 0 {
                    let indirect_id = alloc(bitmap)?;
                    let indirect = Block::zeroed();
                    indirect.store(indirect_id as usize, self.block_device);
                    self.inode.indirect = indirect_id;
                    self.indirect = Some(indirect);
                    log::debug!("indirect block {indirect_id} allocated");
                }

                let block_id = self
                    .indirect_block()
                    .map(0, |indirect: &IndirectBlock| indirect[index]);
                let block_id = self.checked(block_id);
                if block_id != 0 {
                    return Ok((block_id, false));
                }

                let block_id = alloc(bitmap)?;
                let (indirect_id, block_device) = (self.inode.indirect, self.block_device);
                let indirect = self.indirect_block();
                indirect.map_mut(0, |indirect: &mut IndirectBlock| indirect[index] = block_id);
                indirect.store(indirect_id as usize, block_device);
                Ok((block_id, true))
            }
        }
    }
}

impl Translator<'_> {
    /// 数据块区域外的编号按 0 处理
    fn checked(&self, block_id: u32) -> u32 {
        if block_id == 0 || self.geometry.is_data_block(block_id) {
            block_id
        } else {
            log::warn!("ignoring block {block_id} outside the data area");
            0
        }
    }

    fn indirect_block(&mut self) -> &mut Block {
        let (indirect_id, block_device) = (self.inode.indirect, self.block_device);
        self.indirect
            .get_or_insert_with(|| Block::load(indirect_id as usize, block_device))
    }
}

#[inline]
fn alloc(bitmap: &mut Bitmap) -> Result<u32> {
    bitmap.alloc().ok_or(FsError::NoFreeBlock)
}
