/// Points for the player (or team) that solved a word.
pub struct ScoringEngine;

impl ScoringEngine {
    pub const POINTS_PER_LETTER: i32 = 10;
    pub const POINTS_PER_SPARE_ATTEMPT: i32 = 5;
    /// Speed bonus is one point per second left of this window.
    pub const SPEED_WINDOW_MS: i64 = 60_000;

    pub fn score(
        won: bool,
        wrong_count: usize,
        max_attempts: u8,
        elapsed_ms: i64,
        word_length: usize,
    ) -> i32 {
        if !won {
            return 0;
        }

        let base = word_length as i32 * Self::POINTS_PER_LETTER;
        let accuracy_bonus =
            ((max_attempts as i32 - wrong_count as i32) * Self::POINTS_PER_SPARE_ATTEMPT).max(0);
        // Euclidean division floors negative values, which then clamp to zero
        let speed_bonus = (Self::SPEED_WINDOW_MS - elapsed_ms).div_euclid(1000).max(0) as i32;

        base + accuracy_bonus + speed_bonus
    }

    /// Each player's part of a team score. The remainder is dropped.
    pub fn team_share(score: i32, player_count: usize) -> i32 {
        if player_count == 0 {
            return 0;
        }
        score / player_count as i32
    }
}
