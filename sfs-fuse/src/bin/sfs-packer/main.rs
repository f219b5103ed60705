mod cli;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Command};
use sfs::{BLOCK_SIZE, InodeId, SimpleFileSystem};
use sfs_fuse::BlockFile;

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Format { image, blocks } => {
            let mut fs = create_image(&image, blocks)?;
            fs.mount().map_err(io::Error::other)?;
            print!("{}", fs.debug().map_err(io::Error::other)?);
        }
        Command::Pack {
            image,
            blocks,
            source,
        } => {
            let mut fs = create_image(&image, blocks)?;
            fs.mount().map_err(io::Error::other)?;
            pack(&mut fs, &source)?;
        }
        Command::Debug { image } => {
            let fs = open_image(&image)?;
            print!("{}", fs.debug().map_err(io::Error::other)?);
        }
        Command::Cat { image, inode } => {
            let fs = open_image(&image)?;
            let id = InodeId::new(inode);
            let mut data = vec![0; fs.size(id).map_err(io::Error::other)?];
            let read_size = fs.read(id, 0, &mut data).map_err(io::Error::other)?;
            io::stdout().write_all(&data[..read_size])?;
        }
    }

    Ok(())
}

/// 新建（或截断）镜像文件并格式化
fn create_image(path: &Path, blocks: usize) -> io::Result<SimpleFileSystem> {
    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    fd.set_len((blocks * BLOCK_SIZE) as u64)?;

    let mut fs = SimpleFileSystem::new(Arc::new(BlockFile::new(fd)));
    fs.format().map_err(io::Error::other)?;
    Ok(fs)
}

/// 打开已有镜像并挂载
fn open_image(path: &Path) -> io::Result<SimpleFileSystem> {
    let fd = OpenOptions::new().read(true).write(true).open(path)?;
    let mut fs = SimpleFileSystem::new(Arc::new(BlockFile::new(fd)));
    fs.mount().map_err(io::Error::other)?;
    Ok(fs)
}

fn pack(fs: &mut SimpleFileSystem, source: &Path) -> io::Result<()> {
    let mut entries = fs::read_dir(source)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        if !entry.file_type()?.is_file() {
            continue;
        }

        let data = fs::read(entry.path())?;
        let id = fs.create().map_err(io::Error::other)?;
        let written = fs.write(id, 0, &data).map_err(io::Error::other)?;
        if written < data.len() {
            log::warn!(
                "{:?}: only {written} of {} bytes fit",
                entry.file_name(),
                data.len()
            );
        }

        println!("inode {id}: {:?} ({written} bytes)", entry.file_name());
    }

    Ok(())
}
