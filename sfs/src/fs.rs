//! # 文件系统层
//!
//! [`SimpleFileSystem`] 持有块设备与挂载会话。
//! 会话由挂载建立，包含超级块给出的布局以及内存中的空闲块位图；
//! 除格式化与挂载外的一切操作都要求会话存在。

use alloc::sync::Arc;
use alloc::vec::Vec;

use block_dev::BlockDevice;

use crate::block::Block;
use crate::inode_table;
use crate::layout::{Bitmap, DiskInode, IndirectBlock, InodeBlock, InodeId, SuperBlock};
use crate::report::{InodeReport, Report};
use crate::translate::Translator;
use crate::{BLOCK_SIZE, MAX_FILE_SIZE};
use crate::{FsError, Result};

/// 可格式化的最大块数，保证 inode 总数不溢出 `u32`
const MAX_BLOCKS: usize = 1 << 28;

pub struct SimpleFileSystem {
    block_device: Arc<dyn BlockDevice>,
    session: Option<Session>,
}

/// 挂载会话
#[derive(Debug)]
struct Session {
    geometry: Geometry,
    bitmap: Bitmap,
}

/// 超级块记录的磁盘布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// 文件系统占据块数
    pub nblocks: u32,
    /// inode 区域块数
    pub ninodeblocks: u32,
    /// inode 总数
    pub ninodes: u32,
}

impl SimpleFileSystem {
    #[inline]
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self {
            block_device,
            session: None,
        }
    }

    /// 在设备上建立空的文件系统：写入超级块，清空 inode 区域。
    /// 数据块区域保持原样。
    pub fn format(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(FsError::AlreadyMounted);
        }

        let device_blocks = self.block_device.block_count();
        // 至少要放下超级块与一个 inode 块
        if device_blocks < 2 {
            return Err(FsError::DeviceTooSmall(device_blocks));
        }
        let super_block = SuperBlock::new(device_blocks.min(MAX_BLOCKS) as u32);

        let empty = Block::zeroed();
        for block_id in 1..=super_block.ninodeblocks as usize {
            empty.store(block_id, &self.block_device);
        }

        let mut block = Block::zeroed();
        block.map_mut(0, |disk_super_block: &mut SuperBlock| {
            *disk_super_block = super_block
        });
        block.store(0, &self.block_device);

        log::info!(
            "formatted: {} blocks, {} inode blocks, {} inodes",
            super_block.nblocks,
            super_block.ninodeblocks,
            super_block.ninodes
        );
        Ok(())
    }

    /// 读取超级块并扫描 inode 区域，重建空闲块位图。
    ///
    /// 已挂载时丢弃旧会话，重新扫描。
    pub fn mount(&mut self) -> Result<()> {
        if self.session.take().is_some() {
            log::debug!("dropping the previous mount session");
        }

        let super_block = Block::load(0, &self.block_device)
            .map(0, |super_block: &SuperBlock| *super_block);
        if !super_block.is_valid() {
            log::warn!("mount failed: magic number is invalid");
            return Err(FsError::InvalidMagic);
        }
        if !super_block.fits(self.block_device.block_count()) {
            log::warn!("mount failed: {super_block:?} does not fit the device");
            return Err(FsError::InvalidGeometry);
        }

        let geometry = Geometry::from(&super_block);
        let bitmap = self.scan(&geometry);
        log::info!(
            "mounted: {} of {} blocks in use",
            bitmap.used_count(),
            bitmap.len()
        );

        self.session = Some(Session { geometry, bitmap });
        Ok(())
    }

    pub fn unmount(&mut self) -> Result<()> {
        self.session.take().ok_or(FsError::NotMounted)?;
        log::info!("unmounted");
        Ok(())
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.session.is_some()
    }

    pub fn geometry(&self) -> Result<Geometry> {
        Ok(self.session()?.geometry)
    }

    /// 当前会话的空闲块位图
    pub fn bitmap(&self) -> Result<&Bitmap> {
        Ok(&self.session()?.bitmap)
    }

    /// 分配编号最小的空闲 inode；0 号永不分配
    pub fn create(&mut self) -> Result<InodeId> {
        let geometry = self.session()?.geometry;

        for block_id in 1..=geometry.ninodeblocks as usize {
            // 跳过保留的 0 号 inode
            let skip = usize::from(block_id == 1);
            let free_slot = Block::load(block_id, &self.block_device).map(
                0,
                |inodes: &InodeBlock| {
                    inodes
                        .iter()
                        .skip(skip)
                        .position(|inode| !inode.is_valid())
                        .map(|slot| slot + skip)
                },
            );

            if let Some(slot) = free_slot {
                let id = InodeId::from_pos(block_id, slot);
                inode_table::save(id, &DiskInode::new(), &self.block_device);
                log::debug!("inode {id} created");
                return Ok(id);
            }
        }

        Err(FsError::NoFreeInode)
    }

    /// 释放 inode 及其占有的全部数据块与间接索引块
    pub fn delete(&mut self, id: InodeId) -> Result<()> {
        let session = self.session.as_mut().ok_or(FsError::NotMounted)?;
        let inode = load_valid(&session.geometry, id, &self.block_device)?;

        for block_id in inode.direct_blocks() {
            session.release(block_id);
        }

        if inode.indirect != 0 {
            if session.geometry.is_data_block(inode.indirect) {
                let indirect = Block::load(inode.indirect as usize, &self.block_device);
                indirect.map(0, |pointers: &IndirectBlock| {
                    for &block_id in pointers.iter().filter(|&&block_id| block_id != 0) {
                        session.release(block_id);
                    }
                });
            }
            session.release(inode.indirect);
        }

        // 清空索引、大小与有效位
        inode_table::save(id, &DiskInode::default(), &self.block_device);
        log::debug!("inode {id} deleted");
        Ok(())
    }

    /// 文件大小（字节）
    pub fn size(&self, id: InodeId) -> Result<usize> {
        let session = self.session()?;
        let inode = load_valid(&session.geometry, id, &self.block_device)?;
        Ok(inode.size as usize)
    }

    /// 从 `offset` 处读出数据填充 `buf`，返回读出的字节数。
    ///
    /// 读取不会越过文件大小；未分配的块（空洞）读作全零。
    pub fn read(&self, id: InodeId, offset: usize, buf: &mut [u8]) -> Result<usize> {
        let session = self.session()?;
        let inode = load_valid(&session.geometry, id, &self.block_device)?;

        let end = offset.saturating_add(buf.len()).min(inode.size as usize);
        if offset >= end {
            return Ok(0);
        }

        let mut translator = Translator::new(inode, session.geometry, &self.block_device);
        let mut start = offset;
        // 已读取多少字节
        let mut read_size = 0;
        while start < end {
            // 当前块的逻辑索引
            let block_index = start / BLOCK_SIZE;
            // 当前块的末地址(字节)
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;
            let dest = &mut buf[read_size..read_size + block_read_size];

            match translator.get(block_index) {
                0 => dest.fill(0),
                block_id => {
                    let block = Block::load(block_id as usize, &self.block_device);
                    // 绝对地址 % 块大小 = 块内偏移
                    let inner = start % BLOCK_SIZE;
                    dest.copy_from_slice(&block.bytes()[inner..inner + block_read_size]);
                }
            }

            read_size += block_read_size;
            start = current_block_end;
        }

        Ok(read_size)
    }

    /// 把 `data` 写到 `offset` 处，按需分配数据块，返回写入的字节数。
    ///
    /// 写入截断在最大文件大小处。
    /// 空闲块耗尽时写入提前结束，返回值小于 `data.len()`；
    /// 已写入的部分完整登记在 inode 中。
    pub fn write(&mut self, id: InodeId, offset: usize, data: &[u8]) -> Result<usize> {
        let session = self.session.as_mut().ok_or(FsError::NotMounted)?;
        let inode = load_valid(&session.geometry, id, &self.block_device)?;

        let end = offset.saturating_add(data.len()).min(MAX_FILE_SIZE);
        if offset >= end {
            return Ok(0);
        }

        let mut translator = Translator::new(inode, session.geometry, &self.block_device);
        let mut start = offset;
        let mut written_size = 0;
        while start < end {
            let block_index = start / BLOCK_SIZE;
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;

            let (block_id, fresh) = match translator.get_or_alloc(block_index, &mut session.bitmap)
            {
                Ok(block) => block,
                Err(FsError::NoFreeBlock) => {
                    log::warn!(
                        "inode {id}: out of free blocks after {written_size} of {} bytes",
                        end - offset
                    );
                    // 可能刚分配了间接索引块，需登记
                    inode_table::save(id, translator.inode(), &self.block_device);
                    break;
                }
                Err(e) => return Err(e),
            };

            // 新块视为全零；已有的块先读出，保留未覆盖的字节
            let mut block = if fresh {
                Block::zeroed()
            } else {
                Block::load(block_id as usize, &self.block_device)
            };
            let inner = start % BLOCK_SIZE;
            block.bytes_mut()[inner..inner + block_write_size]
                .copy_from_slice(&data[written_size..written_size + block_write_size]);
            block.store(block_id as usize, &self.block_device);

            written_size += block_write_size;
            start = current_block_end;

            let inode = translator.inode_mut();
            inode.size = inode.size.max(start as u32);
            inode_table::save(id, translator.inode(), &self.block_device);
        }

        Ok(written_size)
    }

    /// 超级块与全部有效 inode 的概览
    ///
    /// 超级块只校验魔数，遍历范围取自挂载时的布局。
    pub fn debug(&self) -> Result<Report> {
        let geometry = self.session()?.geometry;

        let super_block = Block::load(0, &self.block_device)
            .map(0, |super_block: &SuperBlock| *super_block);
        if !super_block.is_valid() {
            return Ok(Report::invalid());
        }

        let mut inodes = Vec::new();
        for block_id in 1..=geometry.ninodeblocks as usize {
            let block = Block::load(block_id, &self.block_device);
            let disk_inodes: &InodeBlock = block.get(0);

            for (slot, inode) in disk_inodes.iter().enumerate() {
                if !inode.is_valid() {
                    continue;
                }

                let indirect = (inode.indirect != 0).then(|| {
                    let pointers = if geometry.is_data_block(inode.indirect) {
                        Block::load(inode.indirect as usize, &self.block_device).map(
                            0,
                            |pointers: &IndirectBlock| {
                                pointers
                                    .iter()
                                    .copied()
                                    .filter(|&block_id| block_id != 0)
                                    .collect()
                            },
                        )
                    } else {
                        Vec::new()
                    };
                    (inode.indirect, pointers)
                });

                inodes.push(InodeReport {
                    id: InodeId::from_pos(block_id, slot),
                    size: inode.size,
                    direct: inode.direct_blocks().collect(),
                    indirect,
                });
            }
        }

        Ok(Report::new(geometry, inodes))
    }
}

impl SimpleFileSystem {
    #[inline]
    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(FsError::NotMounted)
    }

    /// 由 inode 区域得出空闲块位图：
    /// 超级块、inode 区域，以及有效 inode 引用的数据块与间接索引块记为占用
    fn scan(&self, geometry: &Geometry) -> Bitmap {
        let mut bitmap = Bitmap::new(geometry.nblocks as usize);
        bitmap.mark(0);

        for block_id in 1..=geometry.ninodeblocks as usize {
            bitmap.mark(block_id as u32);

            let block = Block::load(block_id, &self.block_device);
            let inodes: &InodeBlock = block.get(0);
            for (slot, inode) in inodes.iter().enumerate() {
                if !inode.is_valid() {
                    continue;
                }

                let id = InodeId::from_pos(block_id, slot);
                for data_block in inode.direct_blocks() {
                    claim(&mut bitmap, geometry, id, data_block);
                }

                if inode.indirect == 0 || !claim(&mut bitmap, geometry, id, inode.indirect) {
                    continue;
                }
                Block::load(inode.indirect as usize, &self.block_device).map(
                    0,
                    |pointers: &IndirectBlock| {
                        for &data_block in pointers.iter().filter(|&&block| block != 0) {
                            claim(&mut bitmap, geometry, id, data_block);
                        }
                    },
                );
            }
        }

        bitmap
    }
}

impl Session {
    /// 把块归还位图；不在数据块区域内的编号只记录警告
    fn release(&mut self, block_id: u32) {
        if self.geometry.is_data_block(block_id) {
            self.bitmap.release(block_id);
            log::trace!("block {block_id} released");
        } else {
            log::warn!("refusing to release block {block_id} outside the data area");
        }
    }
}

impl Geometry {
    /// 数据块区域的起始块
    #[inline]
    pub fn data_start(&self) -> u32 {
        self.ninodeblocks + 1
    }

    #[inline]
    pub fn is_data_block(&self, block_id: u32) -> bool {
        (self.data_start()..self.nblocks).contains(&block_id)
    }

    #[inline]
    pub fn contains(&self, id: InodeId) -> bool {
        id != InodeId::RESERVED && u32::from(id) < self.ninodes
    }
}

impl From<&SuperBlock> for Geometry {
    fn from(super_block: &SuperBlock) -> Self {
        Self {
            nblocks: super_block.nblocks,
            ninodeblocks: super_block.ninodeblocks,
            ninodes: super_block.ninodes,
        }
    }
}

/// 校验编号并读出 inode，要求其已分配
fn load_valid(
    geometry: &Geometry,
    id: InodeId,
    block_device: &Arc<dyn BlockDevice>,
) -> Result<DiskInode> {
    if !geometry.contains(id) {
        return Err(FsError::InvalidInodeNumber(id));
    }

    let inode = inode_table::load(id, block_device);
    if inode.is_valid() {
        Ok(inode)
    } else {
        Err(FsError::InvalidInode(id))
    }
}

/// 挂载扫描时登记 inode 引用的块；越界的编号跳过并返回 `false`
fn claim(bitmap: &mut Bitmap, geometry: &Geometry, id: InodeId, block_id: u32) -> bool {
    if geometry.is_data_block(block_id) {
        bitmap.mark(block_id);
        true
    } else {
        log::warn!("inode {id} points at block {block_id} outside the data area");
        false
    }
}
