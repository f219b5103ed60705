use derive_more::Display;

use crate::InodeId;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[display(fmt = "no file system is mounted")]
    NotMounted,
    #[display(fmt = "file system is mounted")]
    AlreadyMounted,
    #[display(fmt = "magic number is invalid")]
    InvalidMagic,
    /// 超级块记录的布局与设备对不上
    #[display(fmt = "super block does not describe this device")]
    InvalidGeometry,
    /// 编号越界，或为保留的 0 号
    #[display(fmt = "inode number {} is out of range", _0)]
    InvalidInodeNumber(InodeId),
    /// 编号合法，但 inode 未被分配
    #[display(fmt = "inode {} is not allocated", _0)]
    InvalidInode(InodeId),
    #[display(fmt = "no free inode")]
    NoFreeInode,
    #[display(fmt = "no free block")]
    NoFreeBlock,
    #[display(fmt = "device of {} blocks is too small", _0)]
    DeviceTooSmall(usize),
}

impl core::error::Error for FsError {}

pub type Result<T> = core::result::Result<T, FsError>;
