use core::alloc::Layout;
use core::mem::MaybeUninit;

use nebula_arena::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn offset(manager: &BufferManager<'_>, ptr: core::ptr::NonNull<u8>) -> usize {
    ptr.as_ptr() as usize - manager.region().as_ptr() as usize
}

#[test]
fn test_fresh_manager_is_empty() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 32];
    let manager = BufferManager::new(&mut buffer);

    assert_eq!(manager.capacity(), 32);
    assert_eq!(manager.available(), 32);
    assert_eq!(manager.allocated(), 0);
}

#[test]
fn test_exact_fit_then_exhaustion() {
    let mut buffer = [MaybeUninit::<u32>::uninit(); 2];
    let manager = BufferManager::from_elements(&mut buffer);
    assert_eq!(manager.capacity(), 8);

    let first = manager.allocate(4).expect("first int fits");
    let second = manager.allocate(4).expect("second int fits");
    assert_eq!(offset(&manager, first), 0);
    assert_eq!(offset(&manager, second), 4);

    let error = manager.allocate(4).unwrap_err();
    assert_eq!(error, MemoryError::out_of_memory(4, 0));
    assert_eq!(manager.allocated(), 8);
}

#[rstest]
#[case::zero_bytes(0, true)]
#[case::exact(16, true)]
#[case::one_over(17, false)]
#[case::huge(usize::MAX, false)]
fn test_single_request_against_capacity(#[case] size: usize, #[case] fits: bool) {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 16];
    let manager = BufferManager::new(&mut buffer);

    assert_eq!(manager.allocate(size).is_ok(), fits);
    assert_eq!(manager.allocated(), if fits { size } else { 0 });
}

#[test]
fn test_heap_region_uses_whole_slice() {
    let mut buffer = vec![MaybeUninit::<u8>::uninit(); 100];
    let manager = BufferManager::new(&mut buffer);

    assert_eq!(manager.capacity(), 100);
    manager.allocate(100).expect("whole buffer");
    assert!(manager.allocate(1).is_err());
}

#[test]
fn test_raw_parts_region() {
    let mut storage = [MaybeUninit::<u8>::uninit(); 24];
    let start = core::ptr::NonNull::from(&mut storage).cast::<u8>();
    let manager = unsafe { BufferManager::from_raw_parts(start, storage.len()) };

    let ptr = manager.allocate(10).expect("fits");
    assert_eq!(ptr, start);
    assert_eq!(manager.available(), 14);
}

#[test]
fn test_mixed_layouts_stay_aligned() {
    let mut buffer = [MaybeUninit::<u64>::uninit(); 4];
    let manager = BufferManager::from_elements(&mut buffer);

    let byte = manager.allocate_layout(Layout::new::<u8>()).expect("u8");
    let word = manager.allocate_layout(Layout::new::<u64>()).expect("u64");
    let short = manager.allocate_layout(Layout::new::<u16>()).expect("u16");

    assert_eq!(offset(&manager, byte), 0);
    assert_eq!(offset(&manager, word), 8);
    assert_eq!(offset(&manager, short), 16);
    assert_eq!(manager.allocated(), 18);
}

#[test]
fn test_failed_layout_request_consumes_no_padding() {
    let mut buffer = [MaybeUninit::<u64>::uninit(); 2];
    let manager = BufferManager::from_elements(&mut buffer);
    manager.allocate(1).expect("one byte");

    // 7 bytes of padding + 16 does not fit into the remaining 15
    let error = manager
        .allocate_layout(Layout::array::<u64>(2).expect("layout"))
        .unwrap_err();
    assert!(error.is_out_of_memory());
    assert_eq!(manager.allocated(), 1);
}

#[test]
fn test_padding_overflow_reports_full_request() {
    let mut buffer = [MaybeUninit::<u64>::uninit(); 2];
    let manager = BufferManager::from_elements(&mut buffer);
    manager.allocate(9).expect("nine bytes");

    // 7 bytes of padding + 8 of payload against 7 remaining
    let error = manager.allocate_layout(Layout::new::<u64>()).unwrap_err();
    assert_eq!(error.requested(), 15);
    assert_eq!(error.available(), 7);
}

#[test]
fn test_manager_memory_usage() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 10];
    let manager = BufferManager::new(&mut buffer);
    manager.allocate(9).expect("fits");

    assert_eq!(manager.used_memory(), 9);
    assert_eq!(manager.available_memory(), Some(1));
    assert_eq!(manager.total_memory(), Some(10));
    assert_eq!(manager.is_memory_pressure(80.0), Some(true));
}

#[test]
fn test_debug_preset_tracks_and_fills() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 8];
    let manager = BufferManager::with_config(&mut buffer, BufferConfig::debug());

    let ptr = manager.allocate(3).expect("fits");
    let bytes = unsafe { core::slice::from_raw_parts(ptr.as_ptr(), 3) };
    assert_eq!(bytes, &[0xCC, 0xCC, 0xCC]);

    assert!(manager.allocate(6).is_err());
    let stats = manager.statistics();
    assert!(manager.statistics_enabled());
    assert_eq!(stats.allocation_count, 1);
    assert_eq!(stats.failed_allocations, 1);
    assert_eq!(stats.high_watermark, 3);
}

#[test]
fn test_production_preset_skips_stats() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 8];
    let manager = BufferManager::with_config(&mut buffer, BufferConfig::production());
    manager.allocate(4).expect("fits");

    assert!(!manager.statistics_enabled());
    assert_eq!(manager.statistics().allocation_count, 0);
    // the watermark comes from the cursor, not the counters
    assert_eq!(manager.statistics().high_watermark, 4);
}

#[test]
fn test_snapshot_copies_cursor_value() {
    let mut buffer = [MaybeUninit::<u8>::uninit(); 16];
    let manager = BufferManager::new(&mut buffer);
    manager.allocate(6).expect("fits");

    let snapshot = unsafe { manager.snapshot() };
    assert_eq!(snapshot.allocated(), 6);
    assert_eq!(snapshot.capacity(), 16);

    let from_snapshot = snapshot.allocate(2).expect("fits");
    assert_eq!(offset(&manager, from_snapshot), 6);
    assert_eq!(manager.available(), 10);
}
