use crate::{INODES_PER_BLOCK, MAGIC};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录 inode 区域的大小
///
/// 各字段只在格式化时写入一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub nblocks: u32,
    /// inode 区域块数
    pub ninodeblocks: u32,
    /// inode 总数
    pub ninodes: u32,
}

impl SuperBlock {
    pub fn new(nblocks: u32) -> Self {
        let ninodeblocks = nblocks.div_ceil(10);

        Self {
            magic: MAGIC,
            nblocks,
            ninodeblocks,
            ninodes: ninodeblocks.saturating_mul(INODES_PER_BLOCK as u32),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 魔数正确之外，各字段还需彼此吻合、且不超出设备容量
    pub fn fits(&self, device_blocks: usize) -> bool {
        if self.nblocks as usize > device_blocks {
            return false;
        }

        let expected = Self::new(self.nblocks);
        self.ninodeblocks == expected.ninodeblocks
            && self.ninodes == expected.ninodes
            && self.ninodeblocks < self.nblocks
    }
}
