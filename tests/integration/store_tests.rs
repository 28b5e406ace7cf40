//! Named settings persisted through the file-backed store.

use hamclock_shim::nvram::{ColorTable, N_PATH_COLORS, NV_LAYOUT, Rgb};
use hamclock_shim::ports::ByteStore;
use hamclock_shim::{DebugLevels, NvName, NvStore, StoreError};

use crate::support::{open_store, store_file, temp_config};

#[test]
fn fresh_store_reports_every_slot_absent() {
    let (_dir, cfg) = temp_config();
    let store = open_store(&cfg);
    for name in NvName::all() {
        assert_eq!(store.read_named(name, 0).unwrap(), None, "{name:?}");
    }
    assert_eq!(store.read_color_table(ColorTable::A).unwrap(), None);
}

#[test]
fn settings_survive_reopen() {
    let (_dir, cfg) = temp_config();
    {
        let mut store = open_store(&cfg);
        store.write_string(NvName::Callsign, "K1ABC").unwrap();
        store.write_f32(NvName::DeLat, 42.36).unwrap();
        store.write_u16(NvName::DxPort, 7300).unwrap();
    }
    let store = open_store(&cfg);
    assert_eq!(
        store.read_string(NvName::Callsign).unwrap().as_deref(),
        Some("K1ABC")
    );
    assert_eq!(store.read_f32(NvName::DeLat).unwrap(), Some(42.36));
    assert_eq!(store.read_u16(NvName::DxPort).unwrap(), Some(7300));
    assert_eq!(store.read_u8(NvName::MetricOn).unwrap(), None);
}

#[test]
fn color_tables_survive_reopen() {
    let (_dir, cfg) = temp_config();
    let mut colors = [Rgb::default(); N_PATH_COLORS];
    for (i, c) in colors.iter_mut().enumerate() {
        *c = Rgb::new(i as u8, 0x80, 0xFF - i as u8);
    }
    {
        let mut store = open_store(&cfg);
        store.write_color_table(ColorTable::B, &colors).unwrap();
    }
    let store = open_store(&cfg);
    assert_eq!(store.read_color_table(ColorTable::B).unwrap(), Some(colors));
    assert_eq!(store.read_color_table(ColorTable::A).unwrap(), None);
}

#[test]
fn clobbered_cookie_reads_as_absent() {
    let (dir, cfg) = temp_config();
    {
        let mut store = open_store(&cfg);
        store.write_string(NvName::Callsign, "W1AW").unwrap();
        store.write_string(NvName::DeGrid, "FN31").unwrap();
    }

    let path = store_file(dir.path());
    let text = std::fs::read_to_string(&path).unwrap();
    let cookie = format!("{:08X} 5A", NV_LAYOUT.offset(NvName::Callsign));
    assert!(text.contains(&cookie));
    let clobbered = format!("{:08X} 00", NV_LAYOUT.offset(NvName::Callsign));
    std::fs::write(&path, text.replace(&cookie, &clobbered)).unwrap();

    let store = open_store(&cfg);
    assert_eq!(store.read_string(NvName::Callsign).unwrap(), None);
    assert_eq!(
        store.read_string(NvName::DeGrid).unwrap().as_deref(),
        Some("FN31")
    );
}

#[test]
fn late_duplicate_entries_are_ignored() {
    let (dir, cfg) = temp_config();
    std::fs::write(
        store_file(dir.path()),
        "00000010 AA\n00000011 BB\n00000010 00\n00000005 77\n00000012 CC\n",
    )
    .unwrap();
    let store = open_store(&cfg);
    let ee = store.backend();
    assert_eq!(ee.read(0x10), 0xAA);
    assert_eq!(ee.read(0x11), 0xBB);
    assert_eq!(ee.read(0x05), 0x00);
    assert_eq!(ee.read(0x12), 0xCC);
}

#[test]
fn garbage_lines_are_skipped() {
    let (dir, cfg) = temp_config();
    std::fs::write(
        store_file(dir.path()),
        "not a line\n00000001 01\n\n00000002\n00000003 03 extra\n00000004 04\n",
    )
    .unwrap();
    let store = open_store(&cfg);
    let ee = store.backend();
    assert_eq!(ee.read(1), 0x01);
    assert_eq!(ee.read(3), 0x00);
    assert_eq!(ee.read(4), 0x04);
}

#[test]
fn second_instance_on_same_dir_is_refused() {
    let (_dir, cfg) = temp_config();
    let _first = open_store(&cfg);
    let second = NvStore::open(&cfg, DebugLevels::new());
    assert!(matches!(second, Err(StoreError::Locked { .. })));
}

#[test]
fn separate_dirs_run_side_by_side() {
    let (_a, cfg_a) = temp_config();
    let (_b, cfg_b) = temp_config();
    let mut a = open_store(&cfg_a);
    let b = open_store(&cfg_b);
    a.write_u8(NvName::MetricOn, 1).unwrap();
    assert_eq!(b.read_u8(NvName::MetricOn).unwrap(), None);
}

#[test]
fn erase_restores_default_after_reopen() {
    let (_dir, cfg) = temp_config();
    {
        let mut store = open_store(&cfg);
        store.write_u32(NvName::KxBaud, 0xFFFF).unwrap();
        store.erase_named(NvName::KxBaud).unwrap();
    }
    assert_eq!(open_store(&cfg).read_u32(NvName::KxBaud).unwrap(), None);
}

#[test]
fn corrupt_high_address_keeps_later_settings() {
    let (dir, cfg) = temp_config();
    {
        let mut store = open_store(&cfg);
        store.write_string(NvName::Callsign, "K1ABC").unwrap();
    }
    let path = store_file(dir.path());
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, format!("FFFFFFFF 00\n{text}")).unwrap();

    let store = open_store(&cfg);
    assert_eq!(
        store.read_string(NvName::Callsign).unwrap().as_deref(),
        Some("K1ABC")
    );
}
