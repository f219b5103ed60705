//! 磁盘 inode 与块索引
//!
//! 每个 inode 有 5 个直接索引和 1 个一级间接索引：
//! - 直接索引：直接存放数据块编号；
//! - 间接索引：指向一个间接索引块，整个块连续存储至多 1024 个数据块编号。
//!
//! 块编号 0 表示“未设置”，超级块所在的 0 号块永远不会被当作数据块。

use core::mem;

use derive_more::{Display, From, Into};

use crate::{INODES_PER_BLOCK, POINTERS_PER_BLOCK, POINTERS_PER_INODE};

const INODE_SIZE: usize = mem::size_of::<DiskInode>();

/// 间接索引块
pub type IndirectBlock = [u32; POINTERS_PER_BLOCK];
/// inode 区域内的一个块
pub type InodeBlock = [DiskInode; INODES_PER_BLOCK];

/// inode 编号，0 号保留不分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
#[repr(transparent)]
pub struct InodeId(u32);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct DiskInode {
    isvalid: u32,
    // 不用usize是为了严控布局
    pub size: u32,
    /// 直接索引块编号
    pub direct: [u32; POINTERS_PER_INODE],
    /// 指向一个间接索引块
    pub indirect: u32,
}

/// 文件内第 n 个逻辑块的编号存放在何处
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// 直接索引的下标
    Direct(usize),
    /// 间接索引块内的下标
    Indirect(usize),
}

impl InodeId {
    pub const RESERVED: Self = Self(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// 由 inode 区域内的块号（从 1 起）与块内槽位还原编号
    #[inline]
    pub fn from_pos(block_id: usize, slot: usize) -> Self {
        Self(((block_id - 1) * INODES_PER_BLOCK + slot) as u32)
    }

    /// inode 在磁盘上的位置：**块ID**以及**块内偏移**
    #[inline]
    pub fn disk_pos(self) -> (usize, usize) {
        let index = self.0 as usize;
        // +1 跳过超级块
        let block_id = index / INODES_PER_BLOCK + 1;
        let block_offset = index % INODES_PER_BLOCK * INODE_SIZE;

        (block_id, block_offset)
    }
}

impl From<InodeId> for usize {
    #[inline]
    fn from(id: InodeId) -> Self {
        id.0 as usize
    }
}

impl DiskInode {
    /// 新建的 inode：有效、空文件、无任何索引
    #[inline]
    pub fn new() -> Self {
        Self {
            isvalid: 1,
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.isvalid != 0
    }

    /// 已设置的直接索引
    pub fn direct_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.direct.iter().copied().filter(|&block| block != 0)
    }
}

impl Slot {
    /// 超出单个文件的最大块数时返回空
    pub fn of(block_index: usize) -> Option<Self> {
        if block_index < POINTERS_PER_INODE {
            Some(Self::Direct(block_index))
        } else if block_index < POINTERS_PER_INODE + POINTERS_PER_BLOCK {
            // 剔去直接索引的部分
            Some(Self::Indirect(block_index - POINTERS_PER_INODE))
        } else {
            None
        }
    }
}
