//! crates/wikidle_core/src/evaluator.rs
//!
//! The guess state machine: `no guesses -> in progress -> won`. Reveal state is
//! index-based and derived from the article's span tables, so evaluating a guess
//! never touches markup.

use crate::domain::{Article, GameSession};
use crate::normalize::{is_excluded, normalize};
use std::collections::BTreeSet;

/// Clues unlock every this many attempts.
pub const CLUE_INTERVAL: usize = 25;
/// No clue is offered before this attempt.
pub const FIRST_CLUE_ATTEMPT: usize = 51;

//=========================================================================================
// Outcomes
//=========================================================================================

/// Why a guess was ignored. Ignored guesses leave the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    Duplicate,
    StopWord,
    AlreadyWon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClueStatus {
    /// Too early, or the article has no clues.
    None,
    /// Attempts left until the next clue.
    Countdown { remaining: usize },
    /// A clue unlocked on this attempt. `number` is 1-based.
    Unlocked { number: usize, text: String },
}

/// A guess that was recorded and scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredGuess {
    /// 1-based; equals the number of recorded guesses.
    pub attempt: usize,
    pub word: String,
    pub hits: usize,
    /// Body spans revealed by this guess.
    pub revealed: Vec<usize>,
    /// Title banner positions revealed by this guess.
    pub title_revealed: Vec<usize>,
    /// When true the fully revealed rendering should replace the obscured one.
    pub won: bool,
    pub clue: ClueStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    Rejected(Rejection),
    Scored(ScoredGuess),
}

//=========================================================================================
// Evaluation
//=========================================================================================

/// Records `raw_guess` in `session` and scores it against `article`.
pub fn submit_guess(session: &mut GameSession, article: &Article, raw_guess: &str) -> GuessOutcome {
    if session.won {
        return GuessOutcome::Rejected(Rejection::AlreadyWon);
    }

    let key = normalize(raw_guess);
    if raw_guess.trim().is_empty() {
        return GuessOutcome::Rejected(Rejection::Empty);
    }
    if session.guesses.iter().any(|g| normalize(g) == key) {
        return GuessOutcome::Rejected(Rejection::Duplicate);
    }
    if is_excluded(&key) {
        return GuessOutcome::Rejected(Rejection::StopWord);
    }

    session.guesses.push(raw_guess.to_string());

    let revealed = article.spans_for(&key).to_vec();
    if check_win(article, &session.guesses) {
        session.won = true;
    }

    let attempt = session.guesses.len();
    GuessOutcome::Scored(ScoredGuess {
        attempt,
        word: raw_guess.to_string(),
        hits: revealed.len(),
        revealed,
        title_revealed: title_positions(article, &key),
        won: session.won,
        clue: clue_status(attempt, &article.clues),
    })
}

/// True when every title token is a stop-word or has been guessed.
pub fn check_win(article: &Article, guesses: &[String]) -> bool {
    let guessed: BTreeSet<String> = guesses.iter().map(|g| normalize(g)).collect();
    article
        .title_tokens
        .iter()
        .all(|token| token.is_empty() || is_excluded(token) || guessed.contains(token))
}

/// Banner positions whose title token equals `key`.
pub fn title_positions(article: &Article, key: &str) -> Vec<usize> {
    article
        .title_tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| !key.is_empty() && token.as_str() == key)
        .map(|(position, _)| position)
        .collect()
}

/// Clue schedule: nothing before attempt 51, then a clue on every multiple of 25
/// (attempt 75 unlocks the first one) and a countdown in between.
pub fn clue_status(attempt: usize, clues: &[String]) -> ClueStatus {
    if clues.is_empty() || attempt < FIRST_CLUE_ATTEMPT {
        return ClueStatus::None;
    }

    let offset = attempt % CLUE_INTERVAL;
    if offset != 0 {
        return ClueStatus::Countdown {
            remaining: CLUE_INTERVAL - offset,
        };
    }

    let index = attempt / CLUE_INTERVAL - 3;
    match clues.get(index) {
        Some(text) => ClueStatus::Unlocked {
            number: index + 1,
            text: text.clone(),
        },
        None => ClueStatus::None,
    }
}

/// Clues already unlocked after `attempts` recorded guesses, in unlock order.
pub fn unlocked_clues(attempts: usize, clues: &[String]) -> &[String] {
    if attempts < FIRST_CLUE_ATTEMPT {
        return &[];
    }
    let earned = (attempts / CLUE_INTERVAL).saturating_sub(2);
    &clues[..earned.min(clues.len())]
}

//=========================================================================================
// Replay
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub number: usize,
    pub word: String,
    pub hits: usize,
}

/// Reveal state reconstructed from a list of guesses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub attempts: Vec<Attempt>,
    pub revealed: BTreeSet<usize>,
    pub title_revealed: BTreeSet<usize>,
    pub won: bool,
}

impl Replay {
    /// Revealed spans paired with their original text.
    pub fn revealed_words<'a>(&self, article: &'a Article) -> Vec<(usize, &'a str)> {
        self.revealed
            .iter()
            .filter_map(|i| article.words.get(i).map(|w| (*i, w.as_str())))
            .collect()
    }
}

/// Replays `guesses` from an empty session. Produces exactly what calling
/// [`submit_guess`] once per guess would.
pub fn replay(article: &Article, guesses: &[String]) -> Replay {
    let mut session = GameSession::new(article.id);
    let mut state = Replay {
        attempts: Vec::with_capacity(guesses.len()),
        revealed: BTreeSet::new(),
        title_revealed: BTreeSet::new(),
        won: false,
    };

    for guess in guesses {
        if let GuessOutcome::Scored(scored) = submit_guess(&mut session, article, guess) {
            state.revealed.extend(scored.revealed);
            state.title_revealed.extend(scored.title_revealed);
            state.attempts.push(Attempt {
                number: scored.attempt,
                word: scored.word,
                hits: scored.hits,
            });
        }
    }

    state.won = session.won;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DayKey;
    use std::collections::BTreeMap;

    fn article(title_tokens: &[&str], body: &[&str], clues: &[&str]) -> Article {
        let mut tokens: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut words = BTreeMap::new();
        for (i, word) in body.iter().enumerate() {
            tokens.entry(normalize(word)).or_default().push(i);
            words.insert(i, word.to_string());
        }
        Article {
            id: "20240301".parse::<DayKey>().unwrap(),
            title: title_tokens.join(" "),
            title_tokens: title_tokens.iter().map(|t| t.to_string()).collect(),
            tokens,
            words,
            obscured_html: String::new(),
            unobscured_html: String::new(),
            clues: clues.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn scored(outcome: GuessOutcome) -> ScoredGuess {
        match outcome {
            GuessOutcome::Scored(s) => s,
            other => panic!("expected a scored guess, got {other:?}"),
        }
    }

    #[test]
    fn hits_count_every_occurrence() {
        let art = article(&["sol"], &["Sol", "estrella", "sol"], &[]);
        let mut session = GameSession::new(art.id);

        let guess = scored(submit_guess(&mut session, &art, "SOL"));
        assert_eq!(guess.attempt, 1);
        assert_eq!(guess.hits, 2);
        assert_eq!(guess.revealed, vec![0, 2]);
        assert_eq!(guess.title_revealed, vec![0]);
        assert!(guess.won);
    }

    #[test]
    fn misses_are_still_recorded() {
        let art = article(&["sol"], &["estrella"], &[]);
        let mut session = GameSession::new(art.id);
        let guess = scored(submit_guess(&mut session, &art, "planeta"));
        assert_eq!(guess.hits, 0);
        assert!(guess.revealed.is_empty());
        assert_eq!(session.guesses, vec!["planeta"]);
    }

    #[test]
    fn duplicates_are_case_and_accent_insensitive() {
        let art = article(&["sol"], &["estrella"], &[]);
        let mut session = GameSession::new(art.id);

        scored(submit_guess(&mut session, &art, "Camión"));
        assert_eq!(
            submit_guess(&mut session, &art, "camion"),
            GuessOutcome::Rejected(Rejection::Duplicate)
        );
        assert_eq!(session.guesses.len(), 1);
    }

    #[test]
    fn sol_then_sol_is_a_no_op() {
        let art = article(&["luna"], &["Sol"], &[]);
        let mut session = GameSession::new(art.id);
        scored(submit_guess(&mut session, &art, "Sol"));
        assert_eq!(
            submit_guess(&mut session, &art, "sol"),
            GuessOutcome::Rejected(Rejection::Duplicate)
        );
        assert_eq!(session.guesses.len(), 1);
    }

    #[test]
    fn empty_and_stop_word_guesses_are_ignored() {
        let art = article(&["sol"], &["estrella"], &[]);
        let mut session = GameSession::new(art.id);
        assert_eq!(submit_guess(&mut session, &art, "   "), GuessOutcome::Rejected(Rejection::Empty));
        assert_eq!(submit_guess(&mut session, &art, "Del"), GuessOutcome::Rejected(Rejection::StopWord));
        assert!(session.guesses.is_empty());
    }

    #[test]
    fn punctuation_only_guesses_count_as_misses() {
        let art = article(&["sol"], &["estrella"], &[]);
        let mut session = GameSession::new(art.id);

        let guess = scored(submit_guess(&mut session, &art, "¿?"));
        assert_eq!(guess.attempt, 1);
        assert_eq!(guess.hits, 0);
        assert!(guess.title_revealed.is_empty());
        assert_eq!(
            submit_guess(&mut session, &art, "!!"),
            GuessOutcome::Rejected(Rejection::Duplicate)
        );
        assert_eq!(session.guesses, vec!["¿?"]);
    }

    #[test]
    fn win_needs_every_non_stop_word_title_token() {
        let art = article(&["segunda", "guerra", "de", "mundial"], &[], &[]);
        let mut session = GameSession::new(art.id);

        for word in ["Mundial", "Segunda"] {
            assert!(!scored(submit_guess(&mut session, &art, word)).won);
        }
        assert!(!session.won);

        assert!(scored(submit_guess(&mut session, &art, "GUERRA")).won);
        assert!(session.won);
        assert_eq!(
            submit_guess(&mut session, &art, "otra"),
            GuessOutcome::Rejected(Rejection::AlreadyWon)
        );
        assert!(session.won);
    }

    #[test]
    fn check_win_ignores_guess_order() {
        let art = article(&["segunda", "guerra", "mundial"], &[], &[]);
        let guesses: Vec<String> = ["Mundial", "Guerra", "Segunda"].iter().map(|s| s.to_string()).collect();
        assert!(check_win(&art, &guesses));
        assert!(!check_win(&art, &guesses[..2]));
    }

    #[test]
    fn no_clue_in_the_first_fifty_attempts() {
        let clues = vec!["pista".to_string(); 4];
        for attempt in 1..=50 {
            assert_eq!(clue_status(attempt, &clues), ClueStatus::None);
        }
    }

    #[test]
    fn clue_schedule() {
        let clues = vec!["primera".to_string(), "segunda".to_string()];
        assert_eq!(clue_status(51, &clues), ClueStatus::Countdown { remaining: 24 });
        assert_eq!(clue_status(60, &clues), ClueStatus::Countdown { remaining: 15 });
        assert_eq!(
            clue_status(75, &clues),
            ClueStatus::Unlocked { number: 1, text: "primera".to_string() }
        );
        assert_eq!(
            clue_status(100, &clues),
            ClueStatus::Unlocked { number: 2, text: "segunda".to_string() }
        );
        assert_eq!(clue_status(125, &clues), ClueStatus::None);
        assert_eq!(clue_status(75, &[]), ClueStatus::None);
    }

    #[test]
    fn unlocked_clues_follow_the_schedule() {
        let clues = vec!["a".to_string(), "b".to_string()];
        assert!(unlocked_clues(74, &clues).is_empty());
        assert_eq!(unlocked_clues(75, &clues), &clues[..1]);
        assert_eq!(unlocked_clues(99, &clues), &clues[..1]);
        assert_eq!(unlocked_clues(100, &clues), &clues[..]);
        assert_eq!(unlocked_clues(500, &clues), &clues[..]);
    }

    #[test]
    fn clue_zero_is_produced_exactly_once() {
        let clues = vec!["solo".to_string()];
        let unlocked = (1..=200)
            .filter(|a| matches!(clue_status(*a, &clues), ClueStatus::Unlocked { number: 1, .. }))
            .count();
        assert_eq!(unlocked, 1);
    }

    #[test]
    fn replay_matches_sequential_submission() {
        let art = article(
            &["sistema", "solar"],
            &["Sistema", "planetas", "Sol", "solar", "planetas"],
            &[],
        );
        let guesses: Vec<String> = ["planetas", "Planetas", "de", "sol", "Solar", "Sistema", "extra"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut session = GameSession::new(art.id);
        let mut revealed = BTreeSet::new();
        for g in &guesses {
            if let GuessOutcome::Scored(s) = submit_guess(&mut session, &art, g) {
                revealed.extend(s.revealed);
            }
        }

        let state = replay(&art, &guesses);
        assert_eq!(state.won, session.won);
        assert!(state.won);
        assert_eq!(state.revealed, revealed);
        assert_eq!(
            state.attempts.iter().map(|a| (a.word.as_str(), a.hits)).collect::<Vec<_>>(),
            vec![("planetas", 2), ("sol", 1), ("Solar", 1), ("Sistema", 1)]
        );
        assert_eq!(state.title_revealed, BTreeSet::from([0, 1]));

        let replayed_again = replay(&art, &session.guesses);
        assert_eq!(replayed_again, state);
    }

    #[test]
    fn revealed_words_pairs_spans_with_text() {
        let art = article(&["x"], &["Sol", "luna"], &[]);
        let state = replay(&art, &["sol".to_string()]);
        assert_eq!(state.revealed_words(&art), vec![(0, "Sol")]);
    }
}
