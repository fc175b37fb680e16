//! Integration tests for the dashboard: placement, moves and drag sessions
//! driven the way a shell drives them, checking the grid invariants after
//! every accepted change.

use startgrid_app::application::dashboard::Dashboard;
use startgrid_core::{
    Configuration, DropOutcome, GridCoord, GridSpec, ImageCategory, MoveOutcome, NewsSource,
    Rejection, Shortcut, Span, WidgetKind,
};

const COLS: u32 = 12;

fn dashboard() -> Dashboard {
    Dashboard::new(Configuration::default(), GridSpec::default())
}

fn shortcut() -> Shortcut {
    Shortcut {
        title: "Example".into(),
        url: "https://example.com".into(),
        ..Shortcut::default()
    }
}

/// Small deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u32) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) % u64::from(bound)) as u32
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn test_adjacent_shortcuts_push_next_slot_to_fifth_column() {
    let mut dash = dashboard();
    let a = dash.add_shortcut(shortcut(), Span::new(2, 1)).unwrap();
    let b = dash.add_shortcut(shortcut(), Span::new(2, 1)).unwrap();
    assert_eq!(dash.layout().get(&a).unwrap().coord(), GridCoord::new(1, 1));
    assert_eq!(dash.layout().get(&b).unwrap().coord(), GridCoord::new(3, 1));

    let c = dash.add_shortcut(shortcut(), Span::new(2, 1)).unwrap();

    assert_eq!(dash.layout().get(&c).unwrap().coord(), GridCoord::new(5, 1));
}

#[test]
fn test_move_onto_equal_sized_tile_is_rejected() {
    let mut dash = dashboard();
    let a = dash.add_widget(WidgetKind::History).unwrap();
    let b = dash.add_widget(WidgetKind::History).unwrap();
    let before = dash.configuration().clone();
    let b_at = dash.layout().get(&b).unwrap().coord();

    let outcome = dash.move_item(&a, b_at);

    assert_eq!(outcome, MoveOutcome::Rejected(Rejection::Collision));
    assert_eq!(dash.configuration(), &before);
}

#[test]
fn test_move_one_column_past_right_edge_is_rejected() {
    let mut dash = dashboard();
    let id = dash.add_widget(WidgetKind::ImageOfTheDay).unwrap();
    let w = dash.layout().get(&id).unwrap().w;

    let outcome = dash.move_item(&id, GridCoord::new(COLS - w + 2, 1));

    assert_eq!(outcome, MoveOutcome::Rejected(Rejection::OutOfBounds));
    assert_eq!(
        dash.move_item(&id, GridCoord::new(COLS - w + 1, 1)),
        MoveOutcome::Accepted
    );
}

#[test]
fn test_drag_preview_matches_commit_along_a_path() {
    // Arrange: a 2×2 note at (1,1) and a 3×2 weather tile at (3,1).
    let mut dash = dashboard();
    let note = dash
        .add_widget(WidgetKind::Note {
            content: "hi".into(),
        })
        .unwrap();
    dash.add_widget(WidgetKind::Weather {
        city: String::new(),
    })
    .unwrap();

    // Act / Assert: every preview agrees with what a drop there would do.
    dash.begin_drag(&note);
    let path = [
        Some(GridCoord::new(2, 1)),
        Some(GridCoord::new(6, 1)),
        None,
        Some(GridCoord::new(12, 4)),
        Some(GridCoord::new(3, 3)),
    ];
    for target in path {
        dash.drag_over(target);
        let expected = target
            .map(|at| dash.layout().check_move(&note, at, COLS).is_ok())
            .unwrap_or(false);
        assert_eq!(dash.drag_validity(&note), Some(expected), "at {target:?}");
    }
    let outcome = dash.end_drag(Some(GridCoord::new(3, 3)));

    assert!(matches!(outcome, DropOutcome::Committed { .. }));
    assert_eq!(dash.layout().get(&note).unwrap().coord(), GridCoord::new(3, 3));
}

#[test]
fn test_cancelled_and_rejected_drags_never_change_layout() {
    let mut dash = dashboard();
    let a = dash.add_widget(WidgetKind::History).unwrap();
    let b = dash.add_widget(WidgetKind::History).unwrap();
    let before = dash.configuration().clone();
    let b_at = dash.layout().get(&b).unwrap().coord();

    dash.begin_drag(&a);
    dash.drag_over(Some(GridCoord::new(8, 8)));
    assert!(matches!(dash.cancel_drag(), DropOutcome::Cancelled { .. }));

    dash.begin_drag(&a);
    assert!(matches!(
        dash.end_drag(Some(b_at)),
        DropOutcome::Rejected {
            reason: Rejection::Collision,
            ..
        }
    ));

    assert_eq!(dash.configuration(), &before);
}

#[test]
fn test_random_operation_sequence_keeps_grid_invariants() {
    let kinds = [
        WidgetKind::Weather {
            city: String::new(),
        },
        WidgetKind::News {
            source: NewsSource::Douyin,
        },
        WidgetKind::History,
        WidgetKind::ImageOfTheDay,
        WidgetKind::CuratedImage {
            category: ImageCategory::Jk,
        },
        WidgetKind::Note {
            content: String::new(),
        },
        WidgetKind::TodoList { todos: Vec::new() },
        WidgetKind::Countdown {
            title: String::new(),
            target_date: String::new(),
        },
    ];
    let mut rng = Lcg(0x5eed);
    let mut dash = dashboard();

    for _ in 0..400 {
        match rng.next(5) {
            0 => {
                let kind = kinds[rng.next(kinds.len() as u32) as usize].clone();
                let _ = dash.add_widget(kind);
            }
            1 => {
                let span = Span::new(rng.next(2) + 1, rng.next(2) + 1);
                let _ = dash.add_shortcut(shortcut(), span);
            }
            2 | 3 if !dash.layout().is_empty() => {
                let index = rng.next(dash.layout().len() as u32) as usize;
                let id = dash.layout().items()[index].id.clone();
                let target = GridCoord::new(rng.next(COLS + 2), rng.next(20));
                if rng.next(2) == 0 {
                    dash.move_item(&id, target);
                } else {
                    dash.begin_drag(&id);
                    dash.drag_over(Some(target));
                    dash.end_drag(Some(target));
                }
            }
            4 if dash.layout().len() > 10 => {
                let index = rng.next(dash.layout().len() as u32) as usize;
                let id = dash.layout().items()[index].id.clone();
                dash.remove_item(&id);
            }
            _ => {}
        }
        assert_eq!(dash.layout().check_invariants(COLS), Ok(()));
    }
}

#[test]
fn test_free_slot_search_is_deterministic() {
    let mut first = dashboard();
    let mut second = dashboard();
    for dash in [&mut first, &mut second] {
        dash.add_widget(WidgetKind::News {
            source: NewsSource::Weibo,
        })
        .unwrap();
        dash.add_widget(WidgetKind::History).unwrap();
    }

    let grid = GridSpec::default();
    let a = grid.find_free_slot(Span::new(4, 3), first.layout().items());
    let b = grid.find_free_slot(Span::new(4, 3), second.layout().items());

    assert_eq!(a, b);
    assert_eq!(a, GridCoord::new(6, 1));
}
