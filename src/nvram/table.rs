//! Named-slot table and byte layout.
//!
//! Every persistent setting has a symbolic [`NvName`] and a fixed byte
//! length in [`NV_TABLE`]. Slots are packed from [`NV_BASE`] with no gaps,
//! each preceded by one cookie byte:
//!
//! ```text
//!  NV_BASE
//!  │
//!  ▼
//!  ┌─┬──────────┬─┬──────┬─┬───── ─ ─ ┬─┬────────────┬─┬────────────┐
//!  │C│ slot 0   │C│slot 1│C│   ...    │C│ color A    │C│ color B    │
//!  └─┴──────────┴─┴──────┴─┴───── ─ ─ ┴─┴────────────┴─┴────────────┘
//!                                      ▲                            ▲
//!                          capacity - 2 × COLOR_TABLE_RECORD     capacity
//! ```
//!
//! The two color-table records are addressed backward from the end of the
//! store and are not part of the named table.

use crate::error::StoreError;

/// Legacy flash sector size; the total store capacity.
pub const FLASH_SECTOR_SIZE: usize = 4096;

/// First byte used by named slots. Bytes below it belonged to the
/// pre-NV touch calibration block and are never touched.
pub const NV_BASE: usize = 55;

/// Marks a slot (or color table) as written.
pub const NV_COOKIE: u8 = 0x5A;

/// Entries per path color table.
pub const N_PATH_COLORS: usize = 22;

/// Cookie plus one RGB triple per entry.
pub const COLOR_TABLE_RECORD: usize = 1 + 3 * N_PATH_COLORS;

pub const NV_CALLSIGN_LEN: usize = 12;
pub const NV_GRID_LEN: usize = 7;
pub const NV_HOST_LEN: usize = 26;
pub const NV_WIFI_SSID_LEN: usize = 32;
pub const NV_WIFI_PW_LEN: usize = 64;
pub const NV_SATNAME_LEN: usize = 9;
pub const NV_MAPSTYLE_LEN: usize = 10;
pub const NV_DXCLCMD_LEN: usize = 35;
pub const NV_DXLOGIN_LEN: usize = 12;
pub const NV_DXWLIST_LEN: usize = 26;

/// Symbolic slot names. The discriminant is the slot's index in [`NV_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NvName {
    TouchCalA,
    TouchCalB,
    TouchCalC,
    TouchCalD,
    TouchCalE,
    TouchCalF,
    TouchCalDiv,
    DeTz,
    DeLat,
    DeLng,
    DeGrid,
    DxTz,
    DxLat,
    DxLng,
    DxGrid,
    CallFgColor,
    CallBgColor,
    PropMhz,
    BcPower,
    Callsign,
    WifiSsid,
    WifiPasswd,
    DxHost,
    DxPort,
    DxLogin,
    DxWatchList,
    DxClCmd0,
    DxClCmd1,
    DxClCmd2,
    DxClCmd3,
    DxClCmdMask,
    UseDxCluster,
    Sat1Name,
    DeSrss,
    DxSrss,
    LlGrid,
    UseGpsd,
    GpsdHost,
    NtpHost,
    BrbMode,
    BrightMin,
    BrightMax,
    MapProj,
    MapStyle,
    CenterLng,
    RotateScreen,
    MetricOn,
    LogUsage,
    Pane0RotSet,
    Pane1RotSet,
    Pane2RotSet,
    KxBaud,
}

impl NvName {
    /// Number of named slots.
    pub const COUNT: usize = NvName::KxBaud as usize + 1;

    /// Declared payload length (cookie excluded).
    pub const fn size(self) -> usize {
        NV_TABLE[self as usize].1
    }

    /// Every name in table order.
    pub fn all() -> impl Iterator<Item = NvName> {
        NV_TABLE.iter().map(|&(name, _)| name)
    }

    /// Case-insensitive lookup by the `Debug` spelling, e.g. `"callsign"`.
    pub fn from_label(label: &str) -> Option<NvName> {
        Self::all().find(|n| format!("{n:?}").eq_ignore_ascii_case(label))
    }
}

/// `{name, length}` pairs in enum order.
pub const NV_TABLE: [(NvName, usize); NvName::COUNT] = [
    (NvName::TouchCalA, 4),
    (NvName::TouchCalB, 4),
    (NvName::TouchCalC, 4),
    (NvName::TouchCalD, 4),
    (NvName::TouchCalE, 4),
    (NvName::TouchCalF, 4),
    (NvName::TouchCalDiv, 4),
    (NvName::DeTz, 4),
    (NvName::DeLat, 4),
    (NvName::DeLng, 4),
    (NvName::DeGrid, NV_GRID_LEN),
    (NvName::DxTz, 4),
    (NvName::DxLat, 4),
    (NvName::DxLng, 4),
    (NvName::DxGrid, NV_GRID_LEN),
    (NvName::CallFgColor, 2),
    (NvName::CallBgColor, 2),
    (NvName::PropMhz, 4),
    (NvName::BcPower, 2),
    (NvName::Callsign, NV_CALLSIGN_LEN),
    (NvName::WifiSsid, NV_WIFI_SSID_LEN),
    (NvName::WifiPasswd, NV_WIFI_PW_LEN),
    (NvName::DxHost, NV_HOST_LEN),
    (NvName::DxPort, 2),
    (NvName::DxLogin, NV_DXLOGIN_LEN),
    (NvName::DxWatchList, NV_DXWLIST_LEN),
    (NvName::DxClCmd0, NV_DXCLCMD_LEN),
    (NvName::DxClCmd1, NV_DXCLCMD_LEN),
    (NvName::DxClCmd2, NV_DXCLCMD_LEN),
    (NvName::DxClCmd3, NV_DXCLCMD_LEN),
    (NvName::DxClCmdMask, 1),
    (NvName::UseDxCluster, 1),
    (NvName::Sat1Name, NV_SATNAME_LEN),
    (NvName::DeSrss, 1),
    (NvName::DxSrss, 1),
    (NvName::LlGrid, 1),
    (NvName::UseGpsd, 1),
    (NvName::GpsdHost, NV_HOST_LEN),
    (NvName::NtpHost, NV_HOST_LEN),
    (NvName::BrbMode, 1),
    (NvName::BrightMin, 1),
    (NvName::BrightMax, 1),
    (NvName::MapProj, 1),
    (NvName::MapStyle, NV_MAPSTYLE_LEN),
    (NvName::CenterLng, 2),
    (NvName::RotateScreen, 1),
    (NvName::MetricOn, 1),
    (NvName::LogUsage, 1),
    (NvName::Pane0RotSet, 4),
    (NvName::Pane1RotSet, 4),
    (NvName::Pane2RotSet, 4),
    (NvName::KxBaud, 4),
];

// Table must list every name exactly once, in discriminant order.
const _: () = {
    let mut i = 0;
    while i < NV_TABLE.len() {
        assert!(
            NV_TABLE[i].0 as usize == i,
            "NV_TABLE is out of NvName order"
        );
        assert!(NV_TABLE[i].1 > 0, "NV_TABLE has a zero-length slot");
        i += 1;
    }
};

/// Resolved slot offsets. Each offset addresses the slot's cookie byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NvLayout {
    offsets: [usize; NvName::COUNT],
    end: usize,
}

impl NvLayout {
    /// Walk the table from `base`, accumulating `1 + len` per slot.
    pub const fn new(base: usize) -> Self {
        let mut offsets = [0usize; NvName::COUNT];
        let mut addr = base;
        let mut i = 0;
        while i < NvName::COUNT {
            offsets[i] = addr;
            addr += 1 + NV_TABLE[i].1;
            i += 1;
        }
        Self { offsets, end: addr }
    }

    /// Address of `name`'s cookie byte; payload follows immediately.
    pub const fn offset(&self, name: NvName) -> usize {
        self.offsets[name as usize]
    }

    /// First address past the last named slot.
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Bytes needed including both color tables.
    pub const fn required_bytes(&self) -> usize {
        self.end + 2 * COLOR_TABLE_RECORD
    }

    /// Fail when the layout cannot fit in `capacity` bytes.
    pub fn check_capacity(&self, capacity: usize) -> Result<(), StoreError> {
        let required = self.required_bytes();
        if required > capacity {
            return Err(StoreError::CapacityExceeded { required, capacity });
        }
        Ok(())
    }
}

/// Layout of the production table.
pub const NV_LAYOUT: NvLayout = NvLayout::new(NV_BASE);
