use alloc::vec;
use alloc::vec::Vec;

/// 空闲块位图，每一位对应设备上的一块，置位表示占用。
///
/// 位图只存在于内存，每次挂载时重新构建。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    groups: Vec<u64>,
    /// 位图所指示区域的总块数
    len: usize,
}

impl Bitmap {
    /// 全部空闲的位图
    pub fn new(len: usize) -> Self {
        Self {
            groups: vec![0; len.div_ceil(64)],
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 越界的块视为未占用
    pub fn is_used(&self, block_id: u32) -> bool {
        let block_id = block_id as usize;
        block_id < self.len && self.groups[block_id / 64] & (1 << (block_id % 64)) != 0
    }

    pub fn mark(&mut self, block_id: u32) {
        let block_id = block_id as usize;
        assert!(block_id < self.len, "block {block_id} out of bitmap");
        self.groups[block_id / 64] |= 1 << (block_id % 64);
    }

    pub fn release(&mut self, block_id: u32) {
        let block_id = block_id as usize;
        assert!(block_id < self.len, "block {block_id} out of bitmap");
        self.groups[block_id / 64] &= !(1 << (block_id % 64));
    }

    /// 编号最小的空闲块
    pub fn first_free(&self) -> Option<u32> {
        // 寻找还有剩余空间的bit组(即还有0)
        let block_id = self
            .groups
            .iter()
            .enumerate()
            .find_map(|(group_index, &bits)| {
                (bits != u64::MAX).then(|| group_index * 64 + bits.trailing_ones() as usize)
            })?;

        // 末组的多余位恒为 0，找到的若越界说明已无空闲
        (block_id < self.len).then_some(block_id as u32)
    }

    /// 分配编号最小的空闲块
    pub fn alloc(&mut self) -> Option<u32> {
        let block_id = self.first_free()?;
        self.mark(block_id);
        Some(block_id)
    }

    pub fn used_count(&self) -> usize {
        self.groups.iter().map(|bits| bits.count_ones() as usize).sum()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.len - self.used_count()
    }

    /// 按编号递增遍历被占用的块
    pub fn used_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len as u32).filter(|&block_id| self.is_used(block_id))
    }
}
