use std::rc::Rc;

use crate::atlas::{Sequence, Sprite};
use crate::error::LookupError;
use crate::timer::{SharedClock, Timer};

/// Steps through the frames of a sequence, one frame per timer period.
pub struct Animation {
    frames: Rc<Sequence>,
    endless: bool,
    timer: Timer,
    // None until the first period has run out
    position: Option<usize>,
}

impl Animation {
    pub fn new(frames: Rc<Sequence>, endless: bool, frame_ms: u64, clock: SharedClock) -> Result<Self, LookupError> {
        if frames.is_empty() {
            return Err(LookupError::EmptySequence(frames.name().to_string()));
        }
        Ok(Animation {
            frames,
            endless,
            timer: Timer::new(frame_ms, true, clock),
            position: None,
        })
    }

    /// Advances if a frame period has passed and returns the frame to show.
    pub fn next(&mut self) -> &Sprite {
        if self.timer.is_elapsed() {
            let last = self.frames.len() - 1;
            self.position = Some(match self.position {
                None => 0,
                Some(p) if p >= last && self.endless => 0,
                Some(p) if p >= last => last,
                Some(p) => p + 1,
            });
        }
        self.current()
    }

    pub fn current(&self) -> &Sprite {
        let position = self.position.unwrap_or(0);
        // Frames are never empty, checked in `new`
        match self.frames.nth(position) {
            Some(sprite) => sprite,
            None => unreachable!("animation position {position} past {} frames", self.frames.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.position.unwrap_or(0)
    }

    pub fn is_ended(&self) -> bool {
        !self.endless && self.position.is_some_and(|p| p + 1 >= self.frames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::SpriteAtlas;
    use crate::atlas::tests::rock_sheet;
    use crate::timer::ManualClock;

    fn frames() -> Rc<Sequence> {
        let json = r#"{"blink": {"0": [0, 0, 10, 10], "1": [10, 0, 10, 10], "2": [20, 0, 10, 10]}, "none": {}}"#;
        let atlas = SpriteAtlas::from_manifest_str(json, rock_sheet()).unwrap();
        atlas.sequence("blink").unwrap()
    }

    #[test]
    fn test_endless_animation_wraps() {
        let clock = Rc::new(ManualClock::new(0));
        let mut anim = Animation::new(frames(), true, 100, clock.clone()).unwrap();

        assert_eq!(anim.next().rect().left, 0);
        let mut lefts = Vec::new();
        for _ in 0..5 {
            clock.advance(101);
            lefts.push(anim.next().rect().left);
        }
        assert_eq!(lefts, vec![0, 10, 20, 0, 10]);
        assert!(!anim.is_ended());
    }

    #[test]
    fn test_finite_animation_holds_last_frame() {
        let clock = Rc::new(ManualClock::new(0));
        let mut anim = Animation::new(frames(), false, 50, clock.clone()).unwrap();
        for _ in 0..3 {
            clock.advance(51);
            anim.next();
        }
        assert!(anim.is_ended());
        clock.advance(51);
        assert_eq!(anim.next().rect().left, 20);
        assert_eq!(anim.position(), 2);
    }

    #[test]
    fn test_frame_only_changes_after_period() {
        let clock = Rc::new(ManualClock::new(0));
        let mut anim = Animation::new(frames(), true, 100, clock.clone()).unwrap();
        clock.advance(101);
        anim.next();
        clock.advance(50);
        assert_eq!(anim.next().rect().left, 0);
        clock.advance(51);
        assert_eq!(anim.next().rect().left, 10);
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let atlas = SpriteAtlas::from_manifest_str(r#"{"none": {}}"#, rock_sheet()).unwrap();
        let clock = Rc::new(ManualClock::new(0));
        let err = Animation::new(atlas.sequence("none").unwrap(), true, 10, clock).err().unwrap();
        assert_eq!(err, LookupError::EmptySequence("none".to_string()));
    }
}
