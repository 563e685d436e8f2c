//! Minigame rush: every minigame once, in shuffled order, then a victor.
use rand::RngCore;
use rand::seq::SliceRandom;
use std::fmt;

use crate::events::SessionSink;
use crate::minigame::{
    Dodgeball, MemoryMatch, MiniGame, MinigameKind, MinigameRun, Racer, StarCatch,
};
use crate::player::{Player, Roster};
use crate::screen::Screen;

/// Builds a fresh rule engine for the roster.
pub type MinigameFactory = fn(&Roster) -> Box<dyn MiniGame>;

/// Catalog entry for one minigame.
#[derive(Clone, Copy)]
pub struct MinigameDescriptor {
    pub kind: MinigameKind,
    pub name: &'static str,
    pub instructions: &'static str,
    pub factory: MinigameFactory,
}

impl MinigameDescriptor {
    #[must_use]
    pub fn build(&self, roster: &Roster) -> Box<dyn MiniGame> {
        (self.factory)(roster)
    }
}

impl fmt::Debug for MinigameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinigameDescriptor")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn build_racer(roster: &Roster) -> Box<dyn MiniGame> {
    Box::new(Racer::new(roster))
}

fn build_dodgeball(roster: &Roster) -> Box<dyn MiniGame> {
    Box::new(Dodgeball::new(roster))
}

fn build_star_catch(roster: &Roster) -> Box<dyn MiniGame> {
    Box::new(StarCatch::new(roster))
}

fn build_memory_match(roster: &Roster) -> Box<dyn MiniGame> {
    Box::new(MemoryMatch::new(roster))
}

/// Descriptor for one kind, with its default engine.
#[must_use]
pub fn descriptor(kind: MinigameKind) -> MinigameDescriptor {
    let factory: MinigameFactory = match kind {
        MinigameKind::Racer => build_racer,
        MinigameKind::Dodgeball => build_dodgeball,
        MinigameKind::StarCatch => build_star_catch,
        MinigameKind::MemoryMatch => build_memory_match,
    };
    MinigameDescriptor {
        kind,
        name: kind.name(),
        instructions: kind.instructions(),
        factory,
    }
}

/// Every shipped minigame, in declaration order.
#[must_use]
pub fn catalog() -> Vec<MinigameDescriptor> {
    MinigameKind::ALL.into_iter().map(descriptor).collect()
}

/// Players tied for the most crumbs; empty without players.
#[must_use]
pub fn winners(players: &[Player]) -> Vec<&Player> {
    let Some(best) = players.iter().map(|p| p.crumbs).max() else {
        return Vec::new();
    };
    players.iter().filter(|p| p.crumbs == best).collect()
}

/// Players ordered by crumbs, then wins (both descending), then id.
#[must_use]
pub fn final_standings(players: &[Player]) -> Vec<&Player> {
    let mut standings: Vec<&Player> = players.iter().collect();
    standings.sort_by(|a, b| {
        b.crumbs
            .cmp(&a.crumbs)
            .then(b.wins.cmp(&a.wins))
            .then(a.id.cmp(&b.id))
    });
    standings
}

/// Walks a shuffled queue of minigames.
#[derive(Debug, Clone)]
pub struct RushController {
    queue: Vec<MinigameDescriptor>,
    cursor: usize,
}

impl RushController {
    /// Shuffle the descriptors once; the order is fixed for the rush.
    pub fn new(mut descriptors: Vec<MinigameDescriptor>, rng: &mut dyn RngCore) -> Self {
        descriptors.shuffle(rng);
        log::info!(
            "rush order: {}",
            descriptors
                .iter()
                .map(|d| d.name)
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Self {
            queue: descriptors,
            cursor: 0,
        }
    }

    /// A rush over the full catalog.
    pub fn with_catalog(rng: &mut dyn RngCore) -> Self {
        Self::new(catalog(), rng)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.cursor < self.queue.len()
    }

    #[must_use]
    pub fn current(&self) -> Option<&MinigameDescriptor> {
        self.queue.get(self.cursor)
    }

    /// Move past the current minigame.
    pub fn advance(&mut self) {
        if self.has_next() {
            self.cursor += 1;
            log::info!("rush advanced to {}/{}", self.cursor, self.queue.len());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Minigames already passed.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn order(&self) -> &[MinigameDescriptor] {
        &self.queue
    }

    /// Ask for the intro screen of the current minigame.
    pub fn announce_current(&self, sink: &mut dyn SessionSink) {
        if let Some(current) = self.current() {
            sink.set_screen(Screen::NextMinigame {
                name: current.name.to_string(),
                instructions: current.instructions.to_string(),
            });
        }
    }

    /// Build, set up and announce the current minigame.
    pub fn start_current(
        &self,
        roster: &Roster,
        rng: &mut dyn RngCore,
        sink: &mut dyn SessionSink,
    ) -> Option<MinigameRun> {
        let current = self.current()?;
        Some(MinigameRun::start(current.build(roster), roster, rng, sink))
    }

    /// Request the victory screen with the crumb leaders.
    pub fn finish(&self, roster: &Roster, sink: &mut dyn SessionSink) -> Vec<String> {
        let names: Vec<String> = winners(roster.players())
            .into_iter()
            .map(|p| p.name.clone())
            .collect();
        log::info!("rush finished, winners: {}", names.join(", "));
        sink.set_screen(Screen::Victory {
            winners: names.clone(),
        });
        names
    }
}
