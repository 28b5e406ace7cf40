//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter       | Implements   | Connects to                       |
//! |---------------|--------------|-----------------------------------|
//! | `eeprom`      | ByteStore    | text file under the config dir    |
//! |               |              | in-memory image (`MemEeprom`)     |
//! | `store_path`  | none         | `$HOME/.hamclock`, legacy file    |
//! | `wifi_client` | Transport    | POSIX TCP socket                  |

pub mod eeprom;
pub mod store_path;
pub mod wifi_client;
