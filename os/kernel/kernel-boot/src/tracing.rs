//! # Boot hand-off tracing

use core::fmt;
use kernel_info::boot::KernelBootInfo;
use kernel_info::memory_map::MemoryMap;
use log::{debug, info};

struct LinearOffset(Option<u64>);

impl fmt::Display for LinearOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(offset) => write!(f, "{offset:#018x}"),
            None => f.write_str("<absent>"),
        }
    }
}

pub fn trace_boot_info(boot_info: &KernelBootInfo) {
    info!(
        concat!(
            "Boot Info in Kernel:\n",
            "  BI ptr     = {bi:#018x}\n",
            "  MMAP ptr   = {mmap_ptr:#018x}, regions = {mmap_len}\n",
            "  linear map = {linear}\n",
            "  kernel     = {kstart}..{kend}"
        ),
        bi = core::ptr::from_ref(boot_info) as usize,
        mmap_ptr = boot_info.mmap.regions_ptr,
        mmap_len = boot_info.mmap.region_count,
        linear = LinearOffset(boot_info.linear_map.offset()),
        kstart = boot_info.kernel_image.start(),
        kend = boot_info.kernel_image.end(),
    );
}

pub fn trace_memory_map(map: &MemoryMap<'_>) {
    for (index, region) in map.iter().enumerate() {
        debug!("  [{index:3}] {region:?}");
    }
    info!(
        "Memory map: {} regions, {} KiB usable, top at {}",
        map.len(),
        map.usable_bytes() / 1024,
        map.highest_address()
    );
}
