//! Content type sniffing from leading magic bytes.
//!
//! Descriptions follow libmagic's wording so that substring filters such as
//! `PE32` or `PDF` select the same files they would with `file(1)`.

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "PDF document"),
    (b"PK\x03\x04", "Zip archive data"),
    (b"\x1f\x8b", "gzip compressed data"),
    (b"Rar!\x1a\x07", "RAR archive data"),
    (b"7z\xbc\xaf\x27\x1c", "7-zip archive data"),
    (b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1", "Composite Document File V2 Document"),
    (b"dex\n", "Dalvik dex file"),
    (b"\xca\xfe\xba\xbe", "compiled Java class data"),
    (b"\xfe\xed\xfa\xce", "Mach-O executable"),
    (b"\xce\xfa\xed\xfe", "Mach-O executable"),
    (b"\xfe\xed\xfa\xcf", "Mach-O 64-bit executable"),
    (b"\xcf\xfa\xed\xfe", "Mach-O 64-bit executable"),
    (b"\x89PNG\r\n\x1a\n", "PNG image data"),
    (b"\xff\xd8\xff", "JPEG image data"),
    (b"GIF8", "GIF image data"),
    (b"{\\rtf", "Rich Text Format data"),
];

pub fn describe(data: &[u8]) -> String {
    if data.is_empty() {
        return "empty".to_string();
    }
    if data.starts_with(b"MZ") {
        return describe_mz(data);
    }
    if data.starts_with(b"\x7fELF") {
        return describe_elf(data);
    }
    if data.starts_with(b"PK\x03\x04") && contains(data, b"AndroidManifest.xml") {
        return "Zip archive data (Android package)".to_string();
    }
    if let Some((_, desc)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
        if *desc == "PDF document" {
            if let Some(version) = data.get(5..8).and_then(|v| std::str::from_utf8(v).ok()) {
                return format!("PDF document, version {}", version);
            }
        }
        return desc.to_string();
    }
    describe_text(data)
}

fn contains(data: &[u8], needle: &[u8]) -> bool {
    data.windows(needle.len()).any(|w| w == needle)
}

fn u16_le(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn u32_le(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn describe_mz(data: &[u8]) -> String {
    let pe = u32_le(data, 0x3c)
        .map(|off| off as usize)
        .filter(|&off| data.get(off..off + 4) == Some(b"PE\0\0"));
    let Some(pe) = pe else {
        return "MS-DOS executable".to_string();
    };

    let machine = match u16_le(data, pe + 4) {
        Some(0x014c) => "Intel 80386",
        Some(0x8664) => "x86-64",
        Some(0x01c0) | Some(0x01c4) => "ARM",
        Some(0xaa64) => "Aarch64",
        _ => "unknown processor",
    };
    let characteristics = u16_le(data, pe + 22).unwrap_or(0);
    let optional = pe + 24;
    let format = match u16_le(data, optional) {
        Some(0x20b) => "PE32+",
        _ => "PE32",
    };
    let kind = if characteristics & 0x2000 != 0 {
        "(DLL) "
    } else {
        ""
    };
    let subsystem = match u16_le(data, optional + 68) {
        Some(2) => "(GUI) ",
        Some(3) => "(console) ",
        Some(1) => "(native) ",
        _ => "",
    };

    format!(
        "{} executable {}{}{}, for MS Windows",
        format, kind, subsystem, machine
    )
}

fn describe_elf(data: &[u8]) -> String {
    let class = match data.get(4) {
        Some(1) => "32-bit",
        Some(2) => "64-bit",
        _ => "invalid class",
    };
    let big_endian = data.get(5) == Some(&2);
    let e_type = data.get(16..18).map(|b| {
        if big_endian {
            u16::from_be_bytes([b[0], b[1]])
        } else {
            u16::from_le_bytes([b[0], b[1]])
        }
    });
    let kind = match e_type {
        Some(1) => "relocatable",
        Some(2) => "executable",
        Some(3) => "shared object",
        Some(4) => "core file",
        _ => "unknown type",
    };
    format!(
        "ELF {} {} {}",
        class,
        if big_endian { "MSB" } else { "LSB" },
        kind
    )
}

fn describe_text(data: &[u8]) -> String {
    let head = &data[..data.len().min(8192)];
    if head.starts_with(b"#!") {
        return "script text executable".to_string();
    }
    let printable = |b: &u8| matches!(b, 0x20..=0x7e | b'\t' | b'\n' | b'\r' | 0x0c);
    if head.iter().all(printable) {
        return "ASCII text".to_string();
    }
    // A sequence cut off at the end of `head` is still text.
    let text = match std::str::from_utf8(head) {
        Ok(s) => Some(s),
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).ok(),
        Err(_) => None,
    };
    match text {
        Some(s) if !s.chars().any(|c| c.is_control() && !c.is_whitespace()) => {
            "UTF-8 Unicode text".to_string()
        }
        _ => "data".to_string(),
    }
}
