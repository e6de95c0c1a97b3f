const EBML_SCAN_LIMIT: usize = 4096;

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"ID3") {
        return Some("audio/mpeg");
    }

    if let Some(mime) = mp4_family(bytes) {
        return Some(mime);
    }

    if bytes.starts_with(b"OggS") {
        return Some(ogg_family(bytes));
    }

    if bytes.starts_with(b"fLaC") {
        return Some("audio/x-flac");
    }

    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        return Some("audio/wav");
    }

    if bytes.len() >= 12 && &bytes[0..4] == b"FORM" && &bytes[8..12] == b"AIFF" {
        return Some("audio/aiff");
    }

    if bytes.starts_with(b"#!AMR") {
        return Some("audio/amr");
    }

    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        let head = &bytes[..bytes.len().min(EBML_SCAN_LIMIT)];
        return Some(if contains(head, b"webm") {
            "video/webm"
        } else {
            "video/x-matroska"
        });
    }

    frame_sync(bytes)
}

fn mp4_family(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return None;
    }

    let brand = &bytes[8..12];
    let mime = match brand {
        b"M4A " => "audio/x-m4a",
        b"M4B " | b"F4A " | b"F4B " => "audio/mp4",
        b"M4V " | b"M4VH" | b"M4VP" => "video/x-m4v",
        b"qt  " => "video/quicktime",
        _ if brand.starts_with(b"3g2") => "video/3gpp2",
        _ if brand.starts_with(b"3g") => "video/3gpp",
        _ => "video/mp4",
    };
    Some(mime)
}

fn ogg_family(bytes: &[u8]) -> &'static str {
    let Some(payload) = bytes.get(28..) else {
        return "audio/ogg";
    };

    if payload.starts_with(b"OpusHead") {
        "audio/opus"
    } else if payload.starts_with(b"\x80theora") {
        "video/ogg"
    } else if payload.starts_with(b"\x01video\0") {
        "video/ogg"
    } else {
        "audio/ogg"
    }
}

fn frame_sync(bytes: &[u8]) -> Option<&'static str> {
    let [first, second, ..] = bytes else {
        return None;
    };
    if *first != 0xFF {
        return None;
    }

    if second & 0xF6 == 0xF0 {
        return Some("audio/aac");
    }

    let layer = second & 0x06;
    if second & 0xE0 == 0xE0 && layer != 0 {
        return Some("audio/mpeg");
    }

    None
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
