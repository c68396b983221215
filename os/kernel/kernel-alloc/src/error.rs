use kernel_memory_addresses::{FrameNumber, PhysicalAddress};

/// Fatal conditions while bringing up the frame allocator.
///
/// None of these can be recovered from: without frame accounting the kernel
/// cannot make progress, so the boot path halts on any of them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PmmInitError {
    #[error("the boot loader did not provide a memory map")]
    MissingMemoryMap,
    #[error("the memory map describes no addressable memory")]
    EmptyMemoryMap,
    #[error("the boot loader did not establish a linear mapping of physical memory")]
    MissingLinearMap,
    #[error("kernel image range {start}..{end} is inverted")]
    InvalidKernelImage {
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
    #[error("no usable region can hold the {bitmap_pages}-page frame bitmap")]
    NoRoomForBitmap { bitmap_pages: u64 },
}

/// A free request that was (partly) rejected.
///
/// Frames of the request that were valid have been released regardless.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FreeError {
    #[error("free of {address} is not page aligned")]
    Misaligned { address: PhysicalAddress },
    #[error("frame {first_invalid} is beyond the {total_frames} managed frames")]
    OutOfRange {
        first_invalid: FrameNumber,
        total_frames: u64,
    },
    #[error("frame {frame} is permanently reserved and cannot be freed")]
    Protected { frame: FrameNumber },
}
