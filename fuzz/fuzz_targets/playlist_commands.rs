#![no_main]

use kurenai::model::PlayableFile;
use kurenai::playlist::PlaylistController;
use kurenai::transport::Transport;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut playlist = PlaylistController::new();
    let mut transport = Transport::default();

    for (step, byte) in data.iter().enumerate() {
        match byte % 6 {
            0 => {
                let _ = playlist.next();
            }
            1 => {
                let _ = playlist.prev();
            }
            2 => {
                let _ = playlist.on_track_ended();
            }
            3 => {
                let batch = (0..usize::from(byte / 6 % 4))
                    .map(|n| PlayableFile::new(format!("/music/{step}_{n}.mp3")))
                    .collect();
                let _ = playlist.append(batch);
            }
            4 => {
                let value = f64::from(*byte) * 13.7;
                if byte / 6 % 2 == 0 {
                    transport.seek.begin_drag(value);
                } else {
                    let _ = transport.seek.release();
                }
            }
            _ => {
                let duration = f64::from(byte.wrapping_mul(31)) * 60.0;
                transport.on_position_update(playlist.play_index(), f64::from(*byte), duration);
            }
        }

        if let Some(index) = playlist.index() {
            assert!(index < playlist.len());
        }
        assert_eq!(playlist.index().is_some(), !playlist.is_empty());
    }
});
