#![allow(dead_code)]

use std::sync::Arc;

use block_dev::MemDisk;
use sfs::{BLOCK_SIZE, SimpleFileSystem};

/// 新建内存盘上的文件系统，尚未格式化
pub fn mem_fs(blocks: usize) -> (Arc<MemDisk>, SimpleFileSystem) {
    let disk = Arc::new(MemDisk::new(blocks, BLOCK_SIZE));
    let fs = SimpleFileSystem::new(disk.clone());
    (disk, fs)
}

/// 格式化并挂载
pub fn mounted_fs(blocks: usize) -> (Arc<MemDisk>, SimpleFileSystem) {
    let (disk, mut fs) = mem_fs(blocks);
    fs.format().unwrap();
    fs.mount().unwrap();
    (disk, fs)
}

/// 可辨认的测试数据
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 251) as u8).collect()
}

pub fn used_blocks(fs: &SimpleFileSystem) -> Vec<u32> {
    fs.bitmap().unwrap().used_blocks().collect()
}
