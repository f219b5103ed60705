mod common;

use block_dev::BlockDevice;
use common::{mem_fs, mounted_fs, pattern, used_blocks};
use sfs::{BLOCK_SIZE, FsError, Geometry, InodeId, MAGIC};

/// 组装 inode 区域的一块：`(槽位, [isvalid, size, direct0..5, indirect])`
fn raw_inode_block(inodes: &[(usize, [u32; 8])]) -> Vec<u8> {
    let mut block = vec![0; BLOCK_SIZE];
    for (slot, fields) in inodes {
        for (i, field) in fields.iter().enumerate() {
            let start = slot * 32 + i * 4;
            block[start..start + 4].copy_from_slice(&field.to_ne_bytes());
        }
    }
    block
}

fn raw_pointer_block(pointers: &[u32]) -> Vec<u8> {
    let mut block = vec![0; BLOCK_SIZE];
    for (i, pointer) in pointers.iter().enumerate() {
        block[i * 4..i * 4 + 4].copy_from_slice(&pointer.to_ne_bytes());
    }
    block
}

#[test]
fn format_then_mount() {
    for (nblocks, ninodeblocks) in [(2, 1), (10, 1), (11, 2), (64, 7), (257, 26)] {
        let (_, fs) = mounted_fs(nblocks as usize);

        assert_eq!(
            fs.geometry(),
            Ok(Geometry {
                nblocks,
                ninodeblocks,
                ninodes: ninodeblocks * 128,
            })
        );
        assert_eq!(
            used_blocks(&fs),
            (0..=ninodeblocks).collect::<Vec<_>>(),
            "only metadata is in use on {nblocks} blocks"
        );
        assert_eq!(fs.bitmap().unwrap().len(), nblocks as usize);
    }
}

#[test]
fn unformatted_device() {
    let (_, mut fs) = mem_fs(20);
    assert_eq!(fs.mount(), Err(FsError::InvalidMagic));
    assert!(!fs.is_mounted());
}

#[test]
fn tiny_device() {
    for blocks in [0, 1] {
        let (_, mut fs) = mem_fs(blocks);
        assert_eq!(fs.format(), Err(FsError::DeviceTooSmall(blocks)));
    }
}

#[test]
fn format_while_mounted() {
    let (_, mut fs) = mounted_fs(20);
    assert_eq!(fs.format(), Err(FsError::AlreadyMounted));

    fs.unmount().unwrap();
    assert_eq!(fs.unmount(), Err(FsError::NotMounted));
    assert_eq!(fs.format(), Ok(()));
}

#[test]
fn operations_require_mount() {
    let (_, mut fs) = mem_fs(20);
    fs.format().unwrap();
    let id = InodeId::new(1);

    assert_eq!(fs.create(), Err(FsError::NotMounted));
    assert_eq!(fs.delete(id), Err(FsError::NotMounted));
    assert_eq!(fs.size(id), Err(FsError::NotMounted));
    assert_eq!(fs.read(id, 0, &mut [0; 4]), Err(FsError::NotMounted));
    assert_eq!(fs.write(id, 0, b"data"), Err(FsError::NotMounted));
    assert_eq!(fs.geometry(), Err(FsError::NotMounted));
    assert_eq!(fs.bitmap().err(), Some(FsError::NotMounted));
    assert_eq!(fs.debug().err(), Some(FsError::NotMounted));
}

#[test]
fn bitmap_follows_valid_inodes() {
    let (disk, mut fs) = mem_fs(20);
    fs.format().unwrap();

    // inode 1：直接索引 5、7，间接索引块 9 内有 10、12
    // inode 2：无效，其索引不应计入
    // inode 130：位于第二个 inode 块，直接索引 14
    disk.write_block(
        1,
        &raw_inode_block(&[
            (1, [1, 100, 5, 0, 7, 0, 0, 9]),
            (2, [0, 100, 15, 16, 0, 0, 0, 17]),
        ]),
    );
    disk.write_block(2, &raw_inode_block(&[(2, [1, 1, 14, 0, 0, 0, 0, 0])]));
    disk.write_block(9, &raw_pointer_block(&[10, 0, 12]));

    fs.mount().unwrap();
    assert_eq!(used_blocks(&fs), [0, 1, 2, 5, 7, 9, 10, 12, 14]);
    assert_eq!(fs.size(InodeId::new(1)), Ok(100));
    assert_eq!(fs.size(InodeId::new(130)), Ok(1));
    assert_eq!(
        fs.size(InodeId::new(2)),
        Err(FsError::InvalidInode(InodeId::new(2)))
    );
}

#[test]
fn pointers_outside_data_area_are_skipped() {
    let (disk, mut fs) = mem_fs(20);
    fs.format().unwrap();

    // 指向 inode 区域、越过设备末尾的索引，以及越界的间接索引块
    disk.write_block(
        1,
        &raw_inode_block(&[
            (1, [1, 0, 1, 999, 4, 0, 0, 0]),
            (2, [1, 0, 0, 0, 0, 0, 0, 20]),
        ]),
    );

    fs.mount().unwrap();
    assert_eq!(used_blocks(&fs), [0, 1, 2, 4]);
}

#[test]
fn io_ignores_pointers_outside_data_area() {
    // 20 块：inode 区域 1..=2，数据块从 3 开始
    let (disk, mut fs) = mem_fs(20);
    fs.format().unwrap();
    disk.write_block(
        1,
        &raw_inode_block(&[
            (1, [1, 10, 999, 0, 0, 0, 0, 0]),
            (2, [1, 64, 1, 0, 0, 0, 0, 0]),
            (3, [1, 6 * BLOCK_SIZE as u32, 0, 0, 0, 0, 0, 999]),
        ]),
    );
    fs.mount().unwrap();
    assert_eq!(used_blocks(&fs), [0, 1, 2]);

    // 越界的块读作空洞
    let mut buf = [0xff; 10];
    assert_eq!(fs.read(InodeId::new(1), 0, &mut buf), Ok(10));
    assert_eq!(buf, [0; 10]);
    assert_eq!(fs.read(InodeId::new(3), 5 * BLOCK_SIZE, &mut buf), Ok(10));

    // 写入分配新块，inode 区域保持原样
    assert_eq!(fs.write(InodeId::new(2), 0, &[0; 64]), Ok(64));
    assert_eq!(fs.size(InodeId::new(1)), Ok(10));
    assert_eq!(used_blocks(&fs), [0, 1, 2, 3]);

    let data = pattern(10);
    assert_eq!(fs.write(InodeId::new(3), 5 * BLOCK_SIZE, &data), Ok(10));
    assert_eq!(used_blocks(&fs), [0, 1, 2, 3, 4, 5]);
    assert_eq!(fs.read(InodeId::new(3), 5 * BLOCK_SIZE, &mut buf), Ok(10));
    assert_eq!(buf.as_slice(), data.as_slice());
}

#[test]
fn super_block_larger_than_device() {
    let (disk, mut fs) = mem_fs(20);
    disk.write_block(0, &raw_pointer_block(&[MAGIC, 100, 10, 1280]));
    assert_eq!(fs.mount(), Err(FsError::InvalidGeometry));

    disk.write_block(0, &raw_pointer_block(&[MAGIC, 20, 2, 7]));
    assert_eq!(fs.mount(), Err(FsError::InvalidGeometry));

    disk.write_block(0, &raw_pointer_block(&[MAGIC, 20, 2, 256]));
    assert_eq!(fs.mount(), Ok(()));
}

#[test]
fn remount_rebuilds_bitmap() {
    let (_, mut fs) = mounted_fs(50);
    let id = fs.create().unwrap();
    fs.write(id, 0, &pattern(7 * BLOCK_SIZE)).unwrap();
    let used = used_blocks(&fs);
    let bitmap = fs.bitmap().unwrap().clone();

    // 挂载中再次挂载：重新扫描而非叠加
    fs.mount().unwrap();
    assert_eq!(fs.bitmap(), Ok(&bitmap));

    fs.unmount().unwrap();
    fs.mount().unwrap();
    assert_eq!(used_blocks(&fs), used);
}

#[test]
fn format_clears_inodes_only() {
    let (disk, mut fs) = mounted_fs(20);
    let id = fs.create().unwrap();
    fs.write(id, 0, b"survivor").unwrap();
    fs.unmount().unwrap();

    fs.format().unwrap();
    fs.mount().unwrap();
    assert_eq!(fs.size(id), Err(FsError::InvalidInode(id)));
    assert_eq!(used_blocks(&fs), [0, 1, 2]);
    assert_eq!(fs.create(), Ok(InodeId::new(1)));

    // 数据块区域不被格式化改动
    let mut block = vec![0; BLOCK_SIZE];
    disk.read_block(3, &mut block);
    assert_eq!(&block[..8], b"survivor");
}
