use alloc::vec::Vec;
use core::fmt;

use crate::{Geometry, InodeId};

/// 磁盘现状的概览，`Display` 输出便于人工查看
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// 魔数无效时为空
    pub geometry: Option<Geometry>,
    pub inodes: Vec<InodeReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeReport {
    pub id: InodeId,
    pub size: u32,
    /// 已设置的直接索引
    pub direct: Vec<u32>,
    /// 间接索引块，以及其中已设置的块编号
    pub indirect: Option<(u32, Vec<u32>)>,
}

impl Report {
    #[inline]
    pub(crate) fn new(geometry: Geometry, inodes: Vec<InodeReport>) -> Self {
        Self {
            geometry: Some(geometry),
            inodes,
        }
    }

    #[inline]
    pub(crate) fn invalid() -> Self {
        Self {
            geometry: None,
            inodes: Vec::new(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "superblock:")?;
        let Some(geometry) = &self.geometry else {
            return writeln!(f, "    magic number is invalid");
        };

        writeln!(f, "    magic number is valid")?;
        writeln!(f, "    {} blocks on disk", geometry.nblocks)?;
        writeln!(f, "    {} blocks for inodes", geometry.ninodeblocks)?;
        writeln!(f, "    {} inodes total", geometry.ninodes)?;

        self.inodes.iter().try_for_each(|inode| write!(f, "{inode}"))
    }
}

impl fmt::Display for InodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "inode {}:", self.id)?;
        writeln!(f, "    size {} bytes", self.size)?;
        write!(f, "    direct blocks:")?;
        write_blocks(f, &self.direct)?;

        if let Some((indirect, blocks)) = &self.indirect {
            writeln!(f, "    indirect block: {indirect}")?;
            write!(f, "    indirect data blocks:")?;
            write_blocks(f, blocks)?;
        }

        Ok(())
    }
}

fn write_blocks(f: &mut fmt::Formatter<'_>, blocks: &[u32]) -> fmt::Result {
    for block in blocks {
        write!(f, " {block}")?;
    }
    writeln!(f)
}
