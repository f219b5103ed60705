#![no_std]

extern crate alloc;

/* sfs 的整体架构，自上而下 */

// 文件系统层：格式化、挂载，以及按 inode 编号增删读写
mod fs;
pub use fs::{Geometry, SimpleFileSystem};

// 地址翻译：文件内的逻辑块 -> 磁盘上的物理块
mod translate;

// inode 表：单个 inode 的读出与写回
mod inode_table;

// 调试输出：超级块与全部有效 inode 的概览
mod report;
pub use report::{InodeReport, Report};

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;
pub use layout::{Bitmap, InodeId};

// 块缓冲层：整块读入内存并按类型解释
mod block;

mod error;
pub use error::{FsError, Result};

pub const MAGIC: u32 = 0xf0f03410;
pub const BLOCK_SIZE: usize = 4096;
pub const INODES_PER_BLOCK: usize = 128;
/// 每个 inode 的直接索引数
pub const POINTERS_PER_INODE: usize = 5;
/// 间接索引块可容纳的块编号数
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;
/// 单个文件的最大字节数
pub const MAX_FILE_SIZE: usize = (POINTERS_PER_INODE + POINTERS_PER_BLOCK) * BLOCK_SIZE;

type DataBlock = [u8; BLOCK_SIZE];
