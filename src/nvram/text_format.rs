//! On-disk encoding of the EEPROM image.
//!
//! One line per byte, `%08X %02X\n`: eight hex digits of address, a space,
//! two hex digits of value. No header, footer or checksum.
//!
//! Loading is split into a pure parser ([`parse_lines`]) and the legacy
//! duplicate-rejection rule ([`accept_forward_only`]) so each can be tested
//! on its own.

use std::io::{self, Write};

use log::debug;

/// Parse every well-formed `address value` line. Malformed lines are skipped.
pub fn parse_lines(text: &str) -> Vec<(u32, u8)> {
    text.lines()
        .enumerate()
        .filter_map(|(lineno, line)| {
            let parsed = parse_line(line);
            if parsed.is_none() && !line.trim().is_empty() {
                debug!("eeprom: skipping malformed line {}: {:?}", lineno + 1, line);
            }
            parsed
        })
        .collect()
}

fn parse_line(line: &str) -> Option<(u32, u8)> {
    let mut fields = line.split_whitespace();
    let addr = u32::from_str_radix(fields.next()?, 16).ok()?;
    let value = u8::from_str_radix(fields.next()?, 16).ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((addr, value))
}

/// Keep an entry only if its address is strictly above every address kept
/// before it.
///
/// Some historical writers appended a bogus zero entry for an address they
/// had already emitted. A file produced by [`write_image`] is strictly
/// ascending, so this rule never drops a legitimate byte; it only discards
/// the late duplicates.
pub fn accept_forward_only<I>(pairs: I) -> Vec<(u32, u8)>
where
    I: IntoIterator<Item = (u32, u8)>,
{
    let (_, kept) = pairs.into_iter().fold(
        (None::<u32>, Vec::new()),
        |(highest, mut kept), (addr, value)| match highest {
            Some(h) if addr <= h => {
                debug!("eeprom: ignoring stale entry {:08X} {:02X}", addr, value);
                (highest, kept)
            }
            _ => {
                kept.push((addr, value));
                (Some(addr), kept)
            }
        },
    );
    kept
}

/// Emit the whole image in address order.
pub fn write_image<W: Write>(image: &[u8], mut out: W) -> io::Result<()> {
    for (addr, value) in image.iter().enumerate() {
        writeln!(out, "{:08X} {:02X}", addr, value)?;
    }
    Ok(())
}
