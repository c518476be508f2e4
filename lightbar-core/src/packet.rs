//! Builders for the two fixed 65-byte HID output reports.
//!
//! The layouts were captured from the vendor tool and are used verbatim; no
//! negotiation or read-back exists on this device. Byte 0 is the report id.

use crate::color::FinalColor;

/// Size of every report written to the device, report id included.
pub const REPORT_LEN: usize = 65;

/// One write report.
pub type Report = [u8; REPORT_LEN];

/// First byte offset of the color payload in a stream report.
const STREAM_PAYLOAD_START: usize = 5;
/// Number of identical color triples in a stream report (bytes 5..=61).
const STREAM_TRIPLES: usize = 19;

/// The mode-select report: `0xEC 0x35`, flags at bytes 5 and 8, and one
/// static color sample at bytes 9-11.
///
/// The device protocol is undocumented; the vendor tool sends this before
/// every stream report, not just at session start, and the service
/// replicates that exactly.
pub fn mode_report(color: FinalColor) -> Report {
    let mut report = [0u8; REPORT_LEN];
    report[0] = 0xEC;
    report[1] = 0x35;
    report[5] = 0x01;
    report[8] = 0x01;
    report[9] = color.r;
    report[10] = color.g;
    report[11] = color.b;
    report
}

/// The color-stream report: `0xEC 0x40 0x84`, `0x04` at byte 4, then the
/// same `(r, g, b)` triple repeated for each LED segment.
pub fn stream_report(color: FinalColor) -> Report {
    let mut report = [0u8; REPORT_LEN];
    report[0] = 0xEC;
    report[1] = 0x40;
    report[2] = 0x84;
    report[4] = 0x04;
    for triple in 0..STREAM_TRIPLES {
        let at = STREAM_PAYLOAD_START + triple * 3;
        report[at] = color.r;
        report[at + 1] = color.g;
        report[at + 2] = color.b;
    }
    report
}

/// A stream report with every payload byte zeroed, written while paused.
pub fn black_report() -> Report {
    stream_report(FinalColor::BLACK)
}
