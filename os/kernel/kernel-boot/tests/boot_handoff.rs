use kernel_alloc::PmmInitError;
use kernel_boot::{BootConfig, init_physical_memory_or, try_init_physical_memory};
use kernel_info::boot::{KernelBootInfo, KernelImage, LinearMapInfo, MemoryMapInfo};
use kernel_info::memory_map::{MemoryRegion, MemoryRegionKind};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_sync::NoInterrupts;
use log::LevelFilter;
use std::panic::{AssertUnwindSafe, catch_unwind};

fn kernel_image() -> KernelImage {
    KernelImage::new(PhysicalAddress::new(0x10_0000), PhysicalAddress::new(0x11_0000))
}

fn boot_info(regions: &[MemoryRegion], linear_map: LinearMapInfo) -> KernelBootInfo {
    KernelBootInfo {
        mmap: MemoryMapInfo::from_slice(regions),
        linear_map,
        kernel_image: kernel_image(),
    }
}

#[test]
fn brings_up_physical_memory() {
    let mut ram = vec![0u8; 0x20_0000];
    let offset = ram.as_mut_ptr() as u64;
    let regions = [
        MemoryRegion::new(0, 0x1000, MemoryRegionKind::RESERVED),
        MemoryRegion::usable(0x1000, 0x9_f000),
        MemoryRegion::usable(0x10_0000, 0x10_0000),
    ];
    let bi = boot_info(&regions, LinearMapInfo::new(offset));

    let memory = unsafe { try_init_physical_memory(&bi, NoInterrupts) }.unwrap();
    assert_eq!(memory.frames().total_frames(), 512);

    // Lowest free frame wins, even below the kernel.
    let pa = memory.frames().allocate(1).unwrap();
    assert_eq!(pa, PhysicalAddress::new(0x1000));
    assert_eq!(memory.phys_to_virt(pa), VirtualAddress::new(offset + 0x1000));
    assert_eq!(memory.virt_to_phys(memory.phys_to_virt(pa)), pa);

    let backend = memory.page_backend();
    let page = backend.alloc_pages_zeroed(1).unwrap();
    assert_eq!(page.as_ptr() as u64, offset + 0x2000);
    assert_eq!(backend.free_pages(page.as_ptr(), 1), Ok(()));
    memory.frames().free(pa, 1).unwrap();
}

#[test]
fn missing_memory_map_is_fatal() {
    let bi = KernelBootInfo {
        mmap: MemoryMapInfo::missing(),
        linear_map: LinearMapInfo::new(0),
        kernel_image: kernel_image(),
    };
    let err = unsafe { try_init_physical_memory(&bi, NoInterrupts) }.err();
    assert_eq!(err, Some(PmmInitError::MissingMemoryMap));
}

#[test]
fn missing_linear_map_is_fatal() {
    let regions = [MemoryRegion::usable(0x10_0000, 0x10_0000)];
    let bi = boot_info(&regions, LinearMapInfo::absent());
    let err = unsafe { try_init_physical_memory(&bi, NoInterrupts) }.err();
    assert_eq!(err, Some(PmmInitError::MissingLinearMap));
}

#[test]
fn empty_memory_map_never_reaches_allocation() {
    let bi = boot_info(&[], LinearMapInfo::new(0));

    let outcome = catch_unwind(AssertUnwindSafe(|| unsafe {
        init_physical_memory_or(&bi, NoInterrupts, |e| panic!("halted: {e:?}"))
    }));

    let payload = outcome.err().expect("boot must not proceed");
    let message = payload.downcast_ref::<String>().unwrap();
    assert_eq!(message, "halted: EmptyMemoryMap");
}

#[test]
fn no_room_for_the_bitmap_is_fatal() {
    let mut ram = vec![0u8; 0x1000];
    let regions = [
        MemoryRegion::usable(0x10_0000, 0x800),
        MemoryRegion::new(0x10_0800, 0x10_0000, MemoryRegionKind::RESERVED),
    ];
    let bi = boot_info(&regions, LinearMapInfo::new(ram.as_mut_ptr() as u64));
    let err = unsafe { try_init_physical_memory(&bi, NoInterrupts) }.err();
    assert_eq!(err, Some(PmmInitError::NoRoomForBitmap { bitmap_pages: 1 }));
}

#[test]
fn log_level_follows_features() {
    let expected = if cfg!(feature = "log-trace") {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    assert_eq!(BootConfig::from_features().log_level, expected);
    assert_eq!(BootConfig::default(), BootConfig::from_features());
    assert_eq!(
        BootConfig::default().with_log_level(LevelFilter::Warn).log_level,
        LevelFilter::Warn
    );
}
