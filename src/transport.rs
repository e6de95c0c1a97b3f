use crate::config::sanitize_volume;

const HOUR_SECS: u64 = 3_600;

pub fn format_time(seconds: f64) -> Option<String> {
    let whole = whole_seconds(seconds)?;
    Some(clock(whole, whole >= HOUR_SECS))
}

pub fn position_label(play_index: isize, current: f64, duration: f64) -> Option<String> {
    let current = whole_seconds(current)?;
    let duration = whole_seconds(duration)?;
    let with_hours = duration >= HOUR_SECS;
    Some(format!(
        "{:03} - {} / {}",
        play_index.saturating_add(1).max(0),
        clock(current, with_hours),
        clock(duration, with_hours)
    ))
}

fn whole_seconds(seconds: f64) -> Option<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(seconds.floor() as u64)
}

fn clock(total: u64, with_hours: bool) -> String {
    let hours = total / HOUR_SECS;
    let minutes = (total % HOUR_SECS) / 60;
    let seconds = total % 60;
    if with_hours {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{:02}:{seconds:02}", total / 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeekControl {
    value: f64,
    max: f64,
    seeking: bool,
}

impl SeekControl {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn ratio(&self) -> f64 {
        if self.max > 0.0 {
            (self.value / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn begin_drag(&mut self, value: f64) {
        self.seeking = true;
        self.drag_to(value);
    }

    pub fn drag_to(&mut self, value: f64) {
        if value.is_finite() {
            self.value = value.clamp(0.0, self.max.max(0.0));
        }
    }

    pub fn release(&mut self) -> f64 {
        self.seeking = false;
        self.value
    }

    pub fn sync(&mut self, current: f64, duration: f64) {
        self.max = duration;
        if !self.seeking {
            self.value = current.clamp(0.0, duration.max(0.0));
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transport {
    pub time_label: String,
    pub seek: SeekControl,
    volume: f32,
}

impl Transport {
    pub fn new(volume: f32) -> Self {
        Self {
            time_label: String::new(),
            seek: SeekControl::default(),
            volume: sanitize_volume(volume),
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = sanitize_volume(volume);
        self.volume
    }

    /// Applies one playback tick. Returns false when either value is not a
    /// usable number, in which case nothing changes.
    pub fn on_position_update(&mut self, play_index: isize, current: f64, duration: f64) -> bool {
        let Some(label) = position_label(play_index, current, duration) else {
            return false;
        };
        self.time_label = label;
        self.seek.sync(current, duration);
        true
    }

    pub fn clear(&mut self) {
        self.time_label.clear();
        self.seek.reset();
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_time(65.0).as_deref(), Some("01:05"));
        assert_eq!(format_time(3661.0).as_deref(), Some("01:01:01"));
        assert_eq!(format_time(0.4).as_deref(), Some("00:00"));
        assert_eq!(format_time(3599.9).as_deref(), Some("59:59"));
        assert_eq!(format_time(f64::NAN), None);
        assert_eq!(format_time(f64::INFINITY), None);
    }

    #[test]
    fn label_uses_hours_for_both_values_when_duration_is_long() {
        assert_eq!(
            position_label(0, 65.0, 3661.0).as_deref(),
            Some("001 - 00:01:05 / 01:01:01")
        );
        assert_eq!(
            position_label(11, 5.0, 200.0).as_deref(),
            Some("012 - 00:05 / 03:20")
        );
    }

    #[test]
    fn invalid_tick_keeps_previous_label() {
        let mut transport = Transport::default();
        assert!(transport.on_position_update(0, 10.0, 100.0));
        let before = transport.time_label.clone();

        assert!(!transport.on_position_update(0, 12.0, f64::NAN));
        assert!(!transport.on_position_update(0, f64::NAN, 100.0));
        assert_eq!(transport.time_label, before);
    }

    #[test]
    fn ticks_do_not_fight_a_drag() {
        let mut transport = Transport::default();
        transport.on_position_update(0, 10.0, 100.0);

        transport.seek.begin_drag(70.0);
        transport.on_position_update(0, 11.0, 100.0);
        assert_eq!(transport.seek.value(), 70.0);
        assert_eq!(transport.time_label, "001 - 00:11 / 01:40");

        assert_eq!(transport.seek.release(), 70.0);
        transport.on_position_update(0, 12.0, 100.0);
        assert_eq!(transport.seek.value(), 12.0);
    }

    #[test]
    fn drag_is_clamped_to_duration() {
        let mut seek = SeekControl::default();
        seek.sync(0.0, 50.0);
        seek.begin_drag(80.0);
        assert_eq!(seek.value(), 50.0);
        seek.drag_to(-3.0);
        assert_eq!(seek.value(), 0.0);
    }

    #[test]
    fn volume_is_clamped() {
        let mut transport = Transport::new(4.0);
        assert_eq!(transport.volume(), 1.0);
        assert_eq!(transport.set_volume(-0.5), 0.0);
        assert_eq!(transport.set_volume(0.35), 0.35);
    }
}
