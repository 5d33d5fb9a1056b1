use std::time::{Duration, Instant};

use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    game::{ArcGameService, GameService, GameStatus},
    player::{ArcPlayerService, Player, PlayerService, PlayerStatus},
};

/// Which activity timestamps an eviction decision keys off. `Either` is the
/// default; the other two keep the alternative drafts selectable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutPolicy {
    Request,
    Move,
    Either,
}

impl TimeoutPolicy {
    pub fn parse(raw: &str) -> Option<TimeoutPolicy> {
        match raw {
            "request" => Some(TimeoutPolicy::Request),
            "move" => Some(TimeoutPolicy::Move),
            "either" => Some(TimeoutPolicy::Either),
            _ => None,
        }
    }
}

/// Periodic sweep that evicts games whose participants have gone silent.
/// Idle players are never evicted; only activity tied to an existing game
/// triggers eviction, and the whole game goes down with the stale player.
pub struct Reaper {
    player_service: ArcPlayerService,
    game_service: ArcGameService,
    threshold: Duration,
    policy: TimeoutPolicy,
}

impl Reaper {
    pub fn new(
        player_service: ArcPlayerService,
        game_service: ArcGameService,
        threshold: Duration,
        policy: TimeoutPolicy,
    ) -> Self {
        Self {
            player_service,
            game_service,
            threshold,
            policy,
        }
    }

    /// One pass over the player directory. Takes the clock as a parameter so
    /// tests can advance time. Returns the number of evicted games.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut evicted = 0;
        for player in self.player_service.get_players() {
            if player.status == PlayerStatus::Idle {
                continue;
            }
            let Some(game_id) = player.current_game else {
                // Non-idle player without a game reference; repair the entry
                // once it has gone stale.
                if self.is_stale(&player, now) {
                    self.player_service.release(&player.username);
                }
                continue;
            };
            let Some(game) = self.game_service.get_game(&game_id) else {
                // The game was evicted through the other participant, or a
                // create claimed the player and has not inserted the game
                // yet. Repair only once the claim itself is stale.
                if self.is_stale(&player, now) {
                    self.player_service.release(&player.username);
                }
                continue;
            };
            if self.is_expired(&player, game.status, now) {
                log::info!(
                    "Reaping game {} after inactivity of {}",
                    game_id,
                    player.username
                );
                if self.game_service.evict_game(&game_id) {
                    evicted += 1;
                }
            }
        }
        evicted
    }

    fn is_stale(&self, player: &Player, now: Instant) -> bool {
        now.saturating_duration_since(player.last_request_time) > self.threshold
    }

    fn is_expired(&self, player: &Player, status: GameStatus, now: Instant) -> bool {
        let request_stale =
            now.saturating_duration_since(player.last_request_time) > self.threshold;
        let move_stale = now.saturating_duration_since(player.last_move_time) > self.threshold
            && status == GameStatus::InProgress;
        match self.policy {
            TimeoutPolicy::Request => request_stale,
            TimeoutPolicy::Move => move_stale,
            TimeoutPolicy::Either => request_stale || move_stale,
        }
    }

    pub async fn run(self, interval: Duration, cancellation_token: CancellationToken) {
        loop {
            select! {
                _ = cancellation_token.cancelled() => {
                    log::info!("Reaper shutting down");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
            let evicted = self.sweep(Instant::now());
            if evicted > 0 {
                log::info!("Reaper evicted {} inactive games", evicted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ttt_core::TttPos;

    use super::*;
    use crate::{
        game::{GameId, GameService, GameServiceImpl},
        player::PlayerDirectoryImpl,
    };

    const THRESHOLD: Duration = Duration::from_secs(30);

    fn new_reaper(policy: TimeoutPolicy) -> (Reaper, ArcGameService, ArcPlayerService) {
        let player_service: ArcPlayerService = Arc::new(Box::new(PlayerDirectoryImpl::new()));
        let game_service: ArcGameService = Arc::new(Box::new(GameServiceImpl::new(
            player_service.clone(),
        )));
        let reaper = Reaper::new(
            player_service.clone(),
            game_service.clone(),
            THRESHOLD,
            policy,
        );
        (reaper, game_service, player_service)
    }

    fn later(by: Duration) -> Instant {
        Instant::now() + by
    }

    #[test]
    fn test_sweep_spares_active_games() {
        let (reaper, game_service, _) = new_reaper(TimeoutPolicy::Either);
        let alice = "alice".to_string();
        let bob = "bob".to_string();
        let (game_id, _) = game_service.create_game(&alice).expect("Failed to create game");
        game_service.join_game(&bob, &game_id).expect("Failed to join game");

        assert_eq!(reaper.sweep(Instant::now()), 0);
        assert!(game_service.get_game(&game_id).is_some());
    }

    #[test]
    fn test_sweep_evicts_stale_game_and_resets_players() {
        let (reaper, game_service, player_service) = new_reaper(TimeoutPolicy::Either);
        let alice = "alice".to_string();
        let bob = "bob".to_string();
        let (game_id, _) = game_service.create_game(&alice).expect("Failed to create game");
        game_service.join_game(&bob, &game_id).expect("Failed to join game");

        let evicted = reaper.sweep(later(THRESHOLD + Duration::from_secs(1)));
        assert_eq!(evicted, 1);
        assert!(game_service.get_game(&game_id).is_none());
        for username in [&alice, &bob] {
            let player = player_service.get_player(username).expect("Player not found");
            assert_eq!(player.status, PlayerStatus::Idle);
            assert_eq!(player.current_game, None);
        }
    }

    #[test]
    fn test_sweep_spares_fresh_claim_whose_game_is_not_registered_yet() {
        let (reaper, _, player_service) = new_reaper(TimeoutPolicy::Either);
        let alice = "alice".to_string();
        // A claimed player whose game has not landed in the registry yet,
        // as seen by a sweep running between the claim and the insert.
        player_service
            .try_enter_game(&alice, GameId::new_v4())
            .expect("Failed to enter game");

        assert_eq!(reaper.sweep(Instant::now()), 0);
        let player = player_service.get_player(&alice).expect("Player not found");
        assert_eq!(player.status, PlayerStatus::InMatch);

        // The dangling claim is repaired once it has gone stale.
        assert_eq!(reaper.sweep(later(THRESHOLD + Duration::from_secs(1))), 0);
        let player = player_service.get_player(&alice).expect("Player not found");
        assert_eq!(player.status, PlayerStatus::Idle);
        assert_eq!(player.current_game, None);
    }

    #[test]
    fn test_sweep_never_evicts_idle_players() {
        let (reaper, game_service, player_service) = new_reaper(TimeoutPolicy::Either);
        let alice = "alice".to_string();
        let (game_id, _) = game_service.create_game(&alice).expect("Failed to create game");
        game_service.evict_game(&game_id);

        // The idle player stays in the directory no matter how stale.
        let evicted = reaper.sweep(later(THRESHOLD * 100));
        assert_eq!(evicted, 0);
        assert!(player_service.get_player(&alice).is_some());
    }

    #[test]
    fn test_move_policy_only_applies_to_games_in_progress() {
        let (reaper, game_service, _) = new_reaper(TimeoutPolicy::Move);
        let alice = "alice".to_string();
        let bob = "bob".to_string();
        let (game_id, _) = game_service.create_game(&alice).expect("Failed to create game");
        game_service.join_game(&bob, &game_id).expect("Failed to join game");

        // Conclude the round; move staleness no longer applies.
        let game = game_service.get_game(&game_id).expect("Game not found");
        let x = game.player_of(ttt_core::TttSide::X).expect("X seat empty").clone();
        let o = game.player_of(ttt_core::TttSide::O).expect("O seat empty").clone();
        game_service.make_move(&x, &game_id, TttPos::new(0, 0)).expect("move");
        game_service.make_move(&o, &game_id, TttPos::new(1, 0)).expect("move");
        game_service.make_move(&x, &game_id, TttPos::new(0, 1)).expect("move");
        game_service.make_move(&o, &game_id, TttPos::new(1, 1)).expect("move");
        game_service.make_move(&x, &game_id, TttPos::new(0, 2)).expect("move");

        assert_eq!(reaper.sweep(later(THRESHOLD + Duration::from_secs(1))), 0);
        assert!(game_service.get_game(&game_id).is_some());
    }

    #[test]
    fn test_either_policy_evicts_concluded_game_on_request_staleness() {
        let (reaper, game_service, _) = new_reaper(TimeoutPolicy::Either);
        let alice = "alice".to_string();
        let bob = "bob".to_string();
        let (game_id, _) = game_service.create_game(&alice).expect("Failed to create game");
        game_service.join_game(&bob, &game_id).expect("Failed to join game");

        assert_eq!(reaper.sweep(later(THRESHOLD + Duration::from_secs(1))), 1);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(TimeoutPolicy::parse("request"), Some(TimeoutPolicy::Request));
        assert_eq!(TimeoutPolicy::parse("move"), Some(TimeoutPolicy::Move));
        assert_eq!(TimeoutPolicy::parse("either"), Some(TimeoutPolicy::Either));
        assert_eq!(TimeoutPolicy::parse("both"), None);
    }
}
