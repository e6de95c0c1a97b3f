use crate::model::PlayableFile;

/// Ordered play queue plus the index of the active track.
///
/// Every operation that moves the index returns the newly active track so
/// the caller can load and play it. Operations on an empty queue are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistController {
    queue: Vec<PlayableFile>,
    index: Option<usize>,
}

impl PlaylistController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, files: Vec<PlayableFile>) -> Option<PlayableFile> {
        if files.is_empty() {
            return None;
        }

        let first_new = self.queue.len();
        self.queue.extend(files);
        self.index = Some(first_new);
        self.active_track().cloned()
    }

    pub fn next(&mut self) -> Option<PlayableFile> {
        let last = self.queue.len().checked_sub(1)?;
        self.index = Some(match self.index {
            Some(current) if current < last => current + 1,
            _ => 0,
        });
        self.active_track().cloned()
    }

    pub fn prev(&mut self) -> Option<PlayableFile> {
        let last = self.queue.len().checked_sub(1)?;
        self.index = Some(match self.index {
            Some(0) | None => last,
            Some(current) => current - 1,
        });
        self.active_track().cloned()
    }

    pub fn on_track_ended(&mut self) -> Option<PlayableFile> {
        self.next()
    }

    pub fn active_track(&self) -> Option<&PlayableFile> {
        self.queue.get(self.index?)
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Index in the `-1 = nothing selected` convention used by the labels.
    pub fn play_index(&self) -> isize {
        self.index.map_or(-1, |index| index as isize)
    }

    pub fn queue(&self) -> &[PlayableFile] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert_eq;
    use std::path::PathBuf;

    fn files(names: &[&str]) -> Vec<PlayableFile> {
        names
            .iter()
            .map(|name| PlayableFile::from_normalized(PathBuf::from(format!("/music/{name}"))))
            .collect()
    }

    fn filled(len: usize) -> PlaylistController {
        let names: Vec<String> = (0..len).map(|n| format!("song_{n}.mp3")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut playlist = PlaylistController::new();
        playlist.append(files(&refs));
        playlist
    }

    #[test]
    fn starts_empty_with_no_index() {
        let playlist = PlaylistController::new();
        assert!(playlist.is_empty());
        assert_eq!(playlist.index(), None);
        assert_eq!(playlist.play_index(), -1);
        assert!(playlist.active_track().is_none());
    }

    #[test]
    fn append_on_empty_queue_points_at_first_file() {
        let mut playlist = PlaylistController::new();
        let active = playlist.append(files(&["f1.mp3", "f2.mp3"]));

        assert_eq!(playlist.index(), Some(0));
        assert_eq!(active, files(&["f1.mp3"]).pop());
    }

    #[test]
    fn append_jumps_to_start_of_new_batch() {
        let mut playlist = PlaylistController::new();
        playlist.append(files(&["a.mp3", "b.mp3"]));
        playlist.next();

        let active = playlist.append(files(&["c.mp3", "d.mp3"]));

        assert_eq!(playlist.len(), 4);
        assert_eq!(playlist.index(), Some(2));
        assert_eq!(active, files(&["c.mp3"]).pop());
    }

    #[test]
    fn append_nothing_changes_nothing() {
        let mut playlist = filled(3);
        playlist.next();
        let before = playlist.clone();

        assert_eq!(playlist.append(Vec::new()), None);
        assert_eq!(playlist, before);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut playlist = PlaylistController::new();
        playlist.append(files(&["a.mp3"]));
        playlist.append(files(&["a.mp3"]));
        assert_eq!(playlist.len(), 2);
    }

    #[test]
    fn navigation_on_empty_queue_is_a_no_op() {
        let mut playlist = PlaylistController::new();
        assert_eq!(playlist.next(), None);
        assert_eq!(playlist.prev(), None);
        assert_eq!(playlist.on_track_ended(), None);
        assert_eq!(playlist.index(), None);
    }

    #[test]
    fn next_and_prev_wrap_around() {
        let mut playlist = filled(3);
        assert_eq!(playlist.index(), Some(0));

        playlist.prev();
        assert_eq!(playlist.index(), Some(2));
        playlist.next();
        assert_eq!(playlist.index(), Some(0));
    }

    #[test]
    fn single_track_loops_onto_itself() {
        let mut playlist = filled(1);
        let first = playlist.active_track().cloned();
        assert_eq!(playlist.on_track_ended(), first);
        assert_eq!(playlist.index(), Some(0));
    }

    proptest::proptest! {
        #[test]
        fn next_len_times_returns_to_start(len in 1usize..40, start in 0usize..40) {
            let mut playlist = filled(len);
            for _ in 0..start % len {
                playlist.next();
            }
            let origin = playlist.index();

            for _ in 0..len {
                playlist.next();
            }
            prop_assert_eq!(playlist.index(), origin);
        }

        #[test]
        fn prev_and_next_are_inverse(len in 1usize..40, start in 0usize..40) {
            let mut playlist = filled(len);
            for _ in 0..start % len {
                playlist.next();
            }
            let origin = playlist.index();

            playlist.next();
            playlist.prev();
            prop_assert_eq!(playlist.index(), origin);

            playlist.prev();
            playlist.next();
            prop_assert_eq!(playlist.index(), origin);
        }

        #[test]
        fn index_stays_in_bounds_after_random_ops(ops in proptest::collection::vec(0u8..5, 1..200)) {
            let mut playlist = PlaylistController::new();
            for op in ops {
                let active = match op {
                    0 => playlist.next(),
                    1 => playlist.prev(),
                    2 => playlist.on_track_ended(),
                    3 => playlist.append(Vec::new()),
                    _ => playlist.append(files(&["x.mp3", "y.mp3"])),
                };

                prop_assert_eq!(active.is_some(), !playlist.is_empty() && op != 3);
                if let Some(index) = playlist.index() {
                    proptest::prop_assert!(index < playlist.len());
                }
                prop_assert_eq!(playlist.index().is_some(), !playlist.is_empty());
            }
        }
    }
}
