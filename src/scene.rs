//! # Scene Graph
//!
//! The persistent set of visual elements shown on the matrix. The scene is
//! built once at startup and then only mutated in place: every element sits
//! in a permanent named slot and a refresh cycle replaces slot *content*
//! (text, fill, visibility), never slot identity.
//!
//! ## Draw order
//! Slots are drawn back to front:
//!
//! | # | Slot | Element |
//! |---|------|---------|
//! | 0 | top text | scrolling destination label |
//! | 1 | bottom text | arrival minutes |
//! | 2-3 | borders | background rectangles masking the scrolled text |
//! | 4-7 | route badge | four offset circles forming a bold disc |
//! | 8-9 | route label | route symbol drawn twice, one pixel apart |
//! | 10 | live indicator | small square, blinked while data is live |
//! | 11 | alert indicator | red dot, present only while an alert is posted |
//!
//! The borders sit above the text so the scrolling label is clipped to the
//! text column.

use crate::config::{Config, ScheduleConfig};
use crate::ArrivalSet;

/// Vertical center of the top label
const TOP_TEXT_Y: i32 = 10;
/// Vertical center of the bottom label
const BOTTOM_TEXT_Y: i32 = 22;
/// Center and radius of the route badge disc
const BADGE_CENTER: (i32, i32) = (12, 15);
const BADGE_RADIUS: u32 = 9;
/// Left edge and vertical center of the route symbol
const BADGE_LABEL: (i32, i32) = (10, 16);
const LIVE_ORIGIN: (i32, i32) = (3, 24);
const LIVE_SIZE: u32 = 2;
const ALERT_CENTER: (i32, i32) = (5, 8);
const ALERT_RADIUS: u32 = 2;

/// Text element, positioned by its left edge and vertical center
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLabel {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub color: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectShape {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub fill: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircleShape {
    pub cx: i32,
    pub cy: i32,
    pub radius: u32,
    pub fill: u32,
}

/// Visual state of the live indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorVisual {
    On,
    Off,
}

/// Permanent slot names
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotId {
    TopText,
    BottomText,
    BorderLeft,
    BorderRight,
    RouteCircle(u8),
    RouteLabel(u8),
    LiveIndicator,
    AlertIndicator,
}

/// Borrowed view of one slot's content
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Element<'a> {
    Text(&'a TextLabel),
    Rect(&'a RectShape),
    Circle(&'a CircleShape),
}

/// The scene graph, one field per slot.
#[derive(Clone, Debug)]
pub struct Scene {
    background: u32,
    text_x: i32,
    scroll_offset: i32,
    top_text: TextLabel,
    bottom_text: TextLabel,
    border_left: RectShape,
    border_right: RectShape,
    route_circles: [CircleShape; 4],
    route_labels: [TextLabel; 2],
    live_on: RectShape,
    live_off: RectShape,
    live_visual: IndicatorVisual,
    alert_indicator: CircleShape,
    alert_present: bool,
    populated: bool,
}

impl Scene {
    /// Build the startup scene: empty labels, the configured route symbol in
    /// the badge, and the live indicator lit when enabled.
    pub fn new(config: &Config) -> Self {
        let d = &config.display;
        let text_x = d.text_x.max(0);
        let right_width = d
            .width
            .saturating_sub(text_x as u32 + d.text_column_width);

        let label = |text: &str, x: i32, y: i32, color: u32| TextLabel {
            text: text.to_string(),
            x,
            y,
            color,
        };
        let circle = |dx: i32, dy: i32| CircleShape {
            cx: BADGE_CENTER.0 + dx,
            cy: BADGE_CENTER.1 + dy,
            radius: BADGE_RADIUS,
            fill: d.route_badge,
        };
        let live = |fill: u32| RectShape {
            x: LIVE_ORIGIN.0,
            y: LIVE_ORIGIN.1,
            width: LIVE_SIZE,
            height: LIVE_SIZE,
            fill,
        };
        let route = config.transit.route_id.as_str();

        Scene {
            background: d.background,
            text_x,
            scroll_offset: 0,
            top_text: label("", text_x, TOP_TEXT_Y, d.text),
            bottom_text: label("", text_x, BOTTOM_TEXT_Y, d.text),
            border_left: RectShape {
                x: 0,
                y: 0,
                width: text_x as u32,
                height: d.height,
                fill: d.background,
            },
            border_right: RectShape {
                x: d.width.saturating_sub(right_width) as i32,
                y: 0,
                width: right_width,
                height: d.height,
                fill: d.background,
            },
            route_circles: [circle(0, 0), circle(0, 1), circle(1, 0), circle(1, 1)],
            route_labels: [
                label(route, BADGE_LABEL.0, BADGE_LABEL.1, d.background),
                label(route, BADGE_LABEL.0 + 1, BADGE_LABEL.1, d.background),
            ],
            live_on: live(d.live),
            live_off: live(d.background),
            live_visual: if config.schedule.show_live {
                IndicatorVisual::On
            } else {
                IndicatorVisual::Off
            },
            alert_indicator: CircleShape {
                cx: ALERT_CENTER.0,
                cy: ALERT_CENTER.1,
                radius: ALERT_RADIUS,
                fill: d.alert,
            },
            alert_present: false,
            populated: false,
        }
    }

    /// Push one cycle's result into the scene.
    ///
    /// Live data replaces the destination, times, and route symbol, and
    /// toggles the alert slot when alerts are shown. Without live data the
    /// labels keep their previous content and the live indicator is held on.
    pub fn apply(&mut self, arrivals: Option<&ArrivalSet>, live: bool, config: &ScheduleConfig) {
        match arrivals {
            Some(set) if live => {
                self.top_text.text = set.destination().to_string();
                self.bottom_text.text = set.formatted_times();
                for label in &mut self.route_labels {
                    label.text = set.symbol().to_string();
                }
                if config.show_alert {
                    self.alert_present = set.alert_active();
                }
                self.populated = true;
            }
            _ => {
                if config.show_live {
                    self.live_visual = IndicatorVisual::On;
                }
            }
        }
    }

    /// Shift the top label left by `offset` pixels from its home position.
    pub fn set_scroll_offset(&mut self, offset: i32) {
        self.scroll_offset = offset;
        self.top_text.x = self.text_x + offset;
    }

    pub fn scroll_offset(&self) -> i32 {
        self.scroll_offset
    }

    pub fn set_live_visual(&mut self, visual: IndicatorVisual) {
        self.live_visual = visual;
    }

    pub fn live_visual(&self) -> IndicatorVisual {
        self.live_visual
    }

    /// Color behind every slot
    pub fn background(&self) -> u32 {
        self.background
    }

    pub fn top_text(&self) -> &str {
        &self.top_text.text
    }

    /// Length of the top label in characters
    pub fn top_text_len(&self) -> usize {
        self.top_text.text.chars().count()
    }

    pub fn bottom_text(&self) -> &str {
        &self.bottom_text.text
    }

    pub fn route_symbol(&self) -> &str {
        &self.route_labels[0].text
    }

    pub fn alert_present(&self) -> bool {
        self.alert_present
    }

    /// Whether live data has ever been applied
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Slot identities in draw order
    pub fn slot_ids(&self) -> Vec<SlotId> {
        self.slots().into_iter().map(|(id, _)| id).collect()
    }

    /// Slots and their content in draw order
    pub fn slots(&self) -> Vec<(SlotId, Element<'_>)> {
        let mut slots = Vec::with_capacity(12);
        slots.push((SlotId::TopText, Element::Text(&self.top_text)));
        slots.push((SlotId::BottomText, Element::Text(&self.bottom_text)));
        slots.push((SlotId::BorderLeft, Element::Rect(&self.border_left)));
        slots.push((SlotId::BorderRight, Element::Rect(&self.border_right)));
        for (i, circle) in self.route_circles.iter().enumerate() {
            slots.push((SlotId::RouteCircle(i as u8), Element::Circle(circle)));
        }
        for (i, label) in self.route_labels.iter().enumerate() {
            slots.push((SlotId::RouteLabel(i as u8), Element::Text(label)));
        }
        let live = match self.live_visual {
            IndicatorVisual::On => &self.live_on,
            IndicatorVisual::Off => &self.live_off,
        };
        slots.push((SlotId::LiveIndicator, Element::Rect(live)));
        if self.alert_present {
            slots.push((SlotId::AlertIndicator, Element::Circle(&self.alert_indicator)));
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrivals(alert: bool) -> ArrivalSet {
        ArrivalSet::new(vec![2, 9, 14], "Q", "Coney Island", alert).unwrap()
    }

    #[test]
    fn test_new_scene_layout() {
        let config = Config::default();
        let scene = Scene::new(&config);

        assert_eq!(scene.top_text(), "");
        assert_eq!(scene.bottom_text(), "");
        assert_eq!(scene.route_symbol(), "Q");
        assert_eq!(scene.live_visual(), IndicatorVisual::On);
        assert!(!scene.is_populated());

        let ids = scene.slot_ids();
        assert_eq!(ids.len(), 11);
        assert_eq!(ids[0], SlotId::TopText);
        assert_eq!(ids[10], SlotId::LiveIndicator);

        // Right border covers everything past the text column
        match scene.slots()[3].1 {
            Element::Rect(r) => {
                assert_eq!(r.x, 61);
                assert_eq!(r.width, 3);
            }
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn test_live_indicator_off_when_disabled() {
        let mut config = Config::default();
        config.schedule.show_live = false;
        let scene = Scene::new(&config);
        assert_eq!(scene.live_visual(), IndicatorVisual::Off);
        assert!(scene.slot_ids().contains(&SlotId::LiveIndicator));
    }

    #[test]
    fn test_apply_live_replaces_text() {
        let config = Config::default();
        let mut scene = Scene::new(&config);
        scene.apply(Some(&arrivals(false)), true, &config.schedule);

        assert_eq!(scene.top_text(), "Coney Island");
        assert_eq!(scene.bottom_text(), "2,9,14");
        assert!(!scene.alert_present());
        assert!(scene.is_populated());
    }

    #[test]
    fn test_apply_not_live_keeps_stale_text() {
        let config = Config::default();
        let mut scene = Scene::new(&config);
        scene.apply(Some(&arrivals(false)), true, &config.schedule);
        scene.set_live_visual(IndicatorVisual::Off);

        let newer = ArrivalSet::new(vec![1], "Q", "Brighton Beach", true).unwrap();
        scene.apply(Some(&newer), false, &config.schedule);
        assert_eq!(scene.top_text(), "Coney Island");
        assert_eq!(scene.bottom_text(), "2,9,14");
        assert!(!scene.alert_present());
        assert_eq!(scene.live_visual(), IndicatorVisual::On);

        scene.set_live_visual(IndicatorVisual::Off);
        scene.apply(None, false, &config.schedule);
        assert_eq!(scene.live_visual(), IndicatorVisual::On);
    }

    #[test]
    fn test_alert_toggle_preserves_other_slots() {
        let config = Config::default();
        let mut scene = Scene::new(&config);
        let before = scene.slot_ids();

        scene.apply(Some(&arrivals(true)), true, &config.schedule);
        assert!(scene.alert_present());
        let with_alert = scene.slot_ids();
        assert_eq!(with_alert.len(), before.len() + 1);
        assert_eq!(with_alert.last(), Some(&SlotId::AlertIndicator));
        assert_eq!(&with_alert[..before.len()], &before[..]);

        scene.apply(Some(&arrivals(false)), true, &config.schedule);
        assert!(!scene.alert_present());
        assert_eq!(scene.slot_ids(), before);
    }

    #[test]
    fn test_alert_hidden_when_disabled() {
        let mut config = Config::default();
        config.schedule.show_alert = false;
        let mut scene = Scene::new(&config);
        scene.apply(Some(&arrivals(true)), true, &config.schedule);
        assert!(!scene.alert_present());
    }

    #[test]
    fn test_scroll_offset_moves_top_label_only() {
        let config = Config::default();
        let mut scene = Scene::new(&config);
        scene.set_scroll_offset(-7);

        let slots = scene.slots();
        assert!(matches!(slots[0].1, Element::Text(t) if t.x == 18));
        assert!(matches!(slots[1].1, Element::Text(t) if t.x == 25));
        assert_eq!(scene.scroll_offset(), -7);
    }

    #[test]
    fn test_symbol_follows_data() {
        let config = Config::default();
        let mut scene = Scene::new(&config);
        let set = ArrivalSet::new(vec![4], "5X", "Flatbush Av", false).unwrap();
        scene.apply(Some(&set), true, &config.schedule);
        assert_eq!(scene.route_symbol(), "5X");
    }
}
