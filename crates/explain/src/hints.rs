//! Partner hints: which buckets on the other side of the pair the model
//! favours for a given name.

use nimipari_features::phoneme::simplify_phoneme;
use nimipari_features::NameProfile;
use nimipari_model::{ConditionalTable, Distribution, TableComponent, DEFAULT_ROW};
use nimipari_scoring::{prob_to_score, CompiledModel};
use serde::{Deserialize, Serialize};

/// Probabilities below this are too sparse to recommend.
pub const MIN_HINT_PROB: f64 = 0.01;
/// Buckets within this share of the best probability count as equally good.
pub const HINT_TOLERANCE: f64 = 0.1;
/// Most alternatives listed per component.
pub const MAX_OPTIONS: usize = 3;

/// Baseline used when an artifact has none for a bucket.
const MISSING_BASELINE: f64 = 1e-6;

const LETTER_ORDER: &str = "abcdefghijklmnopqrstuvwxyzåäö";

/// Components covered by name hints. Length is left out; the syllable
/// count carries the same guidance.
const HINT_COMPONENTS: [TableComponent; 8] = [
    TableComponent::VowelLocation,
    TableComponent::VowelOpenness,
    TableComponent::Softness,
    TableComponent::Tone,
    TableComponent::Rhythm,
    TableComponent::Syllables,
    TableComponent::HeadTransition,
    TableComponent::EndStartTransition,
];

/// Side of the pair a name is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    First,
    Last,
}

/// A partner bucket with its conditional probability and its deviation
/// from the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerBucket {
    pub bucket: String,
    pub prob: f64,
    /// `prob_to_score` against the baseline, in [-1, 1]
    pub score: f64,
}

/// Guidance for one component of one name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameHint {
    pub component: String,
    pub label: String,
    pub own_bucket: String,
    pub best: Option<PartnerBucket>,
    pub worst: Option<PartnerBucket>,
    /// Near-best partner buckets, most probable first
    pub options: Vec<PartnerBucket>,
    pub text: String,
}

/// Plain-language reading of a bucket label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketHint {
    pub phrase: String,
    /// Example letters
    pub letters: String,
}

impl BucketHint {
    fn new(phrase: impl Into<String>, letters: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            letters: letters.into(),
        }
    }

    fn with_examples(&self) -> String {
        if self.letters.is_empty() {
            self.phrase.clone()
        } else {
            format!("{} (e.g. {})", self.phrase, self.letters)
        }
    }
}

pub fn component_label(component: TableComponent) -> &'static str {
    match component {
        TableComponent::VowelLocation | TableComponent::EdgeVowelLocation => "Vowel harmony",
        TableComponent::VowelOpenness | TableComponent::EdgeVowelOpenness => "Vowel openness",
        TableComponent::Softness | TableComponent::EdgeSoftness => "Consonant softness",
        TableComponent::Tone | TableComponent::EdgeTone => "Tone (bouba/kiki)",
        TableComponent::Rhythm => "Rhythm",
        TableComponent::Length => "Length",
        TableComponent::Syllables => "Syllable count",
        TableComponent::HeadTransition => "Initial sounds",
        TableComponent::EndStartTransition => "First-to-last junction",
    }
}

/// Distinct simplified letters of a phoneme group, in alphabet order,
/// joined with `/`. Falls back to the raw group when nothing maps.
pub fn format_letters(group: &str) -> String {
    let mut letters: Vec<char> = Vec::new();
    for c in group.chars().filter_map(simplify_phoneme) {
        if LETTER_ORDER.contains(c) && !letters.contains(&c) {
            letters.push(c);
        }
    }
    if letters.is_empty() {
        return group.to_string();
    }
    letters.sort_by_key(|c| LETTER_ORDER.chars().position(|o| o == *c));
    letters.iter().map(char::to_string).collect::<Vec<_>>().join("/")
}

fn describe_pattern(pattern: &str) -> String {
    pattern
        .chars()
        .map(|c| if c == 'R' { "heavy" } else { "light" })
        .collect::<Vec<_>>()
        .join("-")
}

pub fn describe_bucket(component: TableComponent, bucket: &str) -> BucketHint {
    if bucket.is_empty() {
        return BucketHint::default();
    }
    let fixed = match (component, bucket) {
        (TableComponent::VowelLocation, "front_dominant") => Some(("mostly front vowels", "ä, ö, y")),
        (TableComponent::VowelLocation, "back_dominant") => Some(("mostly back vowels", "a, o, u")),
        (TableComponent::VowelLocation, "front_neutral") => Some(("front and neutral vowels", "ä, ö, y + e, i")),
        (TableComponent::VowelLocation, "back_neutral") => Some(("back and neutral vowels", "a, o, u + e, i")),
        (TableComponent::VowelLocation, "neutral_only") => Some(("only neutral vowels", "e, i")),
        (TableComponent::VowelLocation, "mixed") => Some(("a mix of front and back vowels", "a/o/u + ä/ö/y")),
        (TableComponent::VowelOpenness, "open_dominant") => Some(("open vowels", "a, ä")),
        (TableComponent::VowelOpenness, "close_dominant") => Some(("close vowels", "i, y, u")),
        (TableComponent::VowelOpenness, "open_mid") => Some(("open and mid vowels", "a/ä + e/ö/o")),
        (TableComponent::VowelOpenness, "close_mid") => Some(("close and mid vowels", "i/y/u + e/ö/o")),
        (TableComponent::VowelOpenness, "neutral_only") => Some(("only mid vowels", "e, ö, o")),
        (TableComponent::VowelOpenness, "mixed") => Some(("a mix of open and close vowels", "a/ä + i/y/u + e/ö/o")),
        (TableComponent::Softness, "soft_only") => Some(("only soft consonants", "m, n, l, r, j, v")),
        (TableComponent::Softness, "softish") => Some(("mostly soft consonants", "m, n, l, r, j, v")),
        (TableComponent::Softness, "hardish") => Some(("some hard consonants", "k, t, p, s, f, h")),
        (TableComponent::Softness, "hard_only") => Some(("mostly hard consonants", "k, t, p, s, f, h")),
        (TableComponent::Softness, "balanced") => Some(("a balance of soft and hard consonants", "m/n/l/r/j/v + k/t/p/s/f/h")),
        (TableComponent::Tone, "very_warm") => Some(("a soft, round tone", "m, n, o, u, a, ö")),
        (TableComponent::Tone, "warm") => Some(("a fairly soft tone", "m, n, o, u, a")),
        (TableComponent::Tone, "neutral") => Some(("a neutral tone", "e, i, l")),
        (TableComponent::Tone, "bright") => Some(("a sharp kiki tone", "k, t, s, p")),
        (TableComponent::Tone, "very_bright") => Some(("a very sharp kiki tone", "k, t, s, f")),
        _ => None,
    };
    if let Some((phrase, letters)) = fixed {
        return BucketHint::new(phrase, letters);
    }

    match component {
        TableComponent::Length => BucketHint::new(format!("{bucket} letters"), ""),
        TableComponent::Syllables => BucketHint::new(format!("{bucket} syllables"), ""),
        TableComponent::Rhythm => BucketHint::new(format!("syllables running {}", describe_pattern(bucket)), ""),
        TableComponent::HeadTransition => {
            let letters = format_letters(bucket);
            BucketHint::new(format!("starts with {letters}"), letters)
        }
        TableComponent::EndStartTransition => {
            let letters = format_letters(bucket);
            BucketHint::new(format!("ends with {letters}"), letters)
        }
        _ => BucketHint::new(bucket.replace('_', " "), ""),
    }
}

/// The bucket a name contributes to `component` when playing `role`.
fn own_bucket(profile: &NameProfile, component: TableComponent, role: Role) -> Option<String> {
    let bucket = match component {
        TableComponent::VowelLocation => profile.whole.vowel_location.as_str().to_string(),
        TableComponent::VowelOpenness => profile.whole.vowel_openness.as_str().to_string(),
        TableComponent::Softness => profile.whole.softness.as_str().to_string(),
        TableComponent::Tone => profile.whole.tone.as_str().to_string(),
        TableComponent::Rhythm => profile.rhythm_bucket.clone(),
        TableComponent::Length => profile.length.as_str().to_string(),
        TableComponent::Syllables => profile.syllables.as_str().to_string(),
        TableComponent::HeadTransition => profile.start_group.clone()?,
        TableComponent::EndStartTransition => match role {
            Role::First => profile.end_group.clone()?,
            Role::Last => profile.start_group.clone()?,
        },
        TableComponent::EdgeVowelLocation
        | TableComponent::EdgeVowelOpenness
        | TableComponent::EdgeSoftness
        | TableComponent::EdgeTone => return None,
    };
    Some(bucket).filter(|b| !b.is_empty())
}

fn baseline_of(baseline: Option<&Distribution>, bucket: &str) -> f64 {
    baseline
        .and_then(|b| b.get(bucket))
        .copied()
        .unwrap_or(MISSING_BASELINE)
}

/// Conditioning buckets (last-name side) ranked for an observed first-name
/// bucket.
fn partners_for_obs(table: &ConditionalTable, baseline: Option<&Distribution>, obs: &str) -> Vec<PartnerBucket> {
    let base = baseline_of(baseline, obs);
    let mut partners: Vec<PartnerBucket> = table
        .iter()
        .filter(|(cond, _)| cond.as_str() != DEFAULT_ROW)
        .map(|(cond, row)| {
            let prob = row.get(obs).copied().unwrap_or(0.0);
            PartnerBucket {
                bucket: cond.clone(),
                prob,
                score: prob_to_score(prob, base),
            }
        })
        .filter(|p| p.prob >= MIN_HINT_PROB)
        .collect();
    partners.sort_by(|a, b| b.score.total_cmp(&a.score));
    partners
}

/// Observed buckets (first-name side) ranked for a conditioning last-name
/// bucket.
fn partners_for_cond(table: &ConditionalTable, baseline: Option<&Distribution>, cond: &str) -> Vec<PartnerBucket> {
    let Some(row) = table.get(cond) else {
        return Vec::new();
    };
    let mut partners: Vec<PartnerBucket> = row
        .iter()
        .map(|(obs, &prob)| PartnerBucket {
            bucket: obs.clone(),
            prob,
            score: prob_to_score(prob, baseline_of(baseline, obs)),
        })
        .filter(|p| p.prob >= MIN_HINT_PROB)
        .collect();
    partners.sort_by(|a, b| b.score.total_cmp(&a.score));
    partners
}

/// Partners within `HINT_TOLERANCE` of the most probable one.
fn near_best(partners: &[PartnerBucket]) -> Vec<PartnerBucket> {
    let mut by_prob = partners.to_vec();
    by_prob.sort_by(|a, b| b.prob.total_cmp(&a.prob));
    let best = by_prob.first().map_or(0.0, |p| p.prob);
    by_prob
        .into_iter()
        .filter(|p| p.prob >= best * (1.0 - HINT_TOLERANCE))
        .take(MAX_OPTIONS)
        .collect()
}

fn join_options(options: &[String]) -> String {
    match options {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

fn hint_text(
    component: TableComponent,
    role: Role,
    own: &str,
    best: Option<&PartnerBucket>,
    options: &[PartnerBucket],
    profile: &NameProfile,
) -> String {
    let transition = matches!(
        component,
        TableComponent::HeadTransition | TableComponent::EndStartTransition
    );
    let best_bucket = best.map_or(own, |b| b.bucket.as_str());
    let own_hint = describe_bucket(component, own);

    match role {
        Role::First if transition => {
            let listed: Vec<String> = options.iter().map(|o| format_letters(&o.bucket)).collect();
            let listed = Some(join_options(&listed))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format_letters(best_bucket));
            format!(
                "The first name {}. It fits best with last names starting with {}.",
                own_hint.phrase, listed
            )
        }
        Role::First => {
            let target = describe_bucket(component, best_bucket);
            format!(
                "The first name has {}. It works best with last names that have {}.",
                own_hint.phrase,
                target.with_examples()
            )
        }
        Role::Last if transition => {
            let listed: Vec<String> = options.iter().map(|o| format_letters(&o.bucket)).collect();
            let listed = Some(join_options(&listed))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format_letters(best_bucket));
            let initial = profile.display.trim().chars().next().map(|c| c.to_lowercase().to_string()).unwrap_or_default();
            if component == TableComponent::HeadTransition {
                format!("The last name starts with \"{initial}\". First names work best when they start with {listed}.")
            } else {
                format!(
                    "The last name starts with \"{initial}\". First names work best when they end in {listed}, \
                     which makes the junction flow."
                )
            }
        }
        Role::Last if component == TableComponent::Rhythm => {
            let patterns: Vec<String> = options.iter().map(|o| describe_pattern(&o.bucket)).collect();
            let patterns = Some(patterns.join("; "))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "alternating heavy-light or light-heavy".to_string());
            format!(
                "The last name's syllables run {}. Pick a first name with a similar heavy/light balance, \
                 for example {}.",
                describe_pattern(own),
                patterns
            )
        }
        Role::Last => {
            let target = describe_bucket(component, best_bucket);
            format!(
                "The last name has {}. The model favours first names with {}.",
                own_hint.phrase,
                target.with_examples()
            )
        }
    }
}

/// Per-component partner guidance for one name.
///
/// A first name is looked up as the observation across every
/// conditioning row; a last name reads its own conditioning row.
pub fn name_hints(profile: &NameProfile, role: Role, model: &CompiledModel) -> Vec<NameHint> {
    let source = model.source();
    HINT_COMPONENTS
        .iter()
        .filter_map(|&component| {
            let table = source.table(component)?;
            let own = own_bucket(profile, component, role)?;
            let baseline = source.baseline(component);
            let partners = match role {
                Role::First => partners_for_obs(table, baseline, &own),
                Role::Last => partners_for_cond(table, baseline, &own),
            };
            let options = near_best(&partners);
            let best = partners.first().cloned();
            let worst = partners.last().cloned();
            let text = hint_text(component, role, &own, best.as_ref(), &options, profile);
            Some(NameHint {
                component: component.table_name().to_string(),
                label: component_label(component).to_string(),
                own_bucket: own,
                best,
                worst,
                options,
                text,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimipari_features::BucketConfig;
    use nimipari_model::{NameEntry, StatisticalModel};
    use pretty_assertions::assert_eq;

    const MODEL_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/model.json"));

    fn model() -> CompiledModel {
        CompiledModel::compile(StatisticalModel::from_json_str(MODEL_JSON).unwrap())
    }

    fn profile(entry: NameEntry) -> NameProfile {
        let mut entry = entry;
        nimipari_features::prepare_entry(&mut entry);
        NameProfile::new(&entry, &BucketConfig::default())
    }

    #[test]
    fn test_format_letters() {
        assert_eq!(format_letters("kʃs"), "k/s");
        assert_eq!(format_letters("øa"), "a/ö");
        assert_eq!(format_letters("#"), "#");
    }

    #[test]
    fn test_join_options() {
        assert_eq!(join_options(&[]), "");
        assert_eq!(join_options(&["a".to_string()]), "a");
        assert_eq!(join_options(&["a".to_string(), "k".to_string(), "s".to_string()]), "a, k or s");
    }

    #[test]
    fn test_describe_bucket() {
        assert_eq!(
            describe_bucket(TableComponent::VowelLocation, "back_dominant").phrase,
            "mostly back vowels"
        );
        assert_eq!(describe_bucket(TableComponent::Syllables, "3").phrase, "3 syllables");
        assert_eq!(
            describe_bucket(TableComponent::Rhythm, "RK").phrase,
            "syllables running heavy-light"
        );
    }

    #[test]
    fn test_last_name_hints_read_own_row() {
        let model = model();
        let korhonen = profile(NameEntry::new("Korhonen", "kor-ho-nen").with_transitions("k", "n"));
        let hints = name_hints(&korhonen, Role::Last, &model);

        let head = hints.iter().find(|h| h.component == "head_transition").unwrap();
        assert_eq!(head.own_bucket, "k");
        // Row "k": l 0.28 is best; nothing else is within 10%.
        let options: Vec<&str> = head.options.iter().map(|o| o.bucket.as_str()).collect();
        assert_eq!(options, vec!["l"]);
        assert!(head.text.contains("start with l"));
        assert!(head.worst.as_ref().unwrap().score < 0.0);
    }

    #[test]
    fn test_first_name_hints_scan_rows() {
        let model = model();
        let aino = profile(NameEntry::new("Aino", "ɑi-no").with_transitions("a", "o"));
        let hints = name_hints(&aino, Role::First, &model);

        let location = hints.iter().find(|h| h.component == "vowel_location").unwrap();
        assert!(location.options.len() <= MAX_OPTIONS);
        assert!(location.options.iter().all(|o| o.prob >= MIN_HINT_PROB));
        let best = location.best.as_ref().unwrap();
        assert!(location.options.iter().all(|o| o.prob <= best.prob + 1e-12));
        assert!(location.text.starts_with("The first name has"));
    }

    #[test]
    fn test_first_name_transition_hint_lists_partner_initials() {
        let model = model();
        let aino = profile(NameEntry::new("Aino", "ɑi-no").with_transitions("a", "o"));
        let hints = name_hints(&aino, Role::First, &model);

        let head = hints.iter().find(|h| h.component == "head_transition").unwrap();
        assert_eq!(head.own_bucket, "a");
        assert!(head.text.starts_with("The first name"));
        assert!(head.text.contains("It fits best with last names starting with"));
    }

    #[test]
    fn test_last_name_rhythm_hint_describes_own_pattern() {
        let model = model();
        let korhonen = profile(NameEntry::new("Korhonen", "kor-ho-nen").with_transitions("k", "n"));
        let hints = name_hints(&korhonen, Role::Last, &model);

        let rhythm = hints.iter().find(|h| h.component == "rhythm").unwrap();
        assert_eq!(rhythm.own_bucket, "RKR");
        assert!(rhythm
            .text
            .starts_with("The last name's syllables run heavy-light-heavy."));
        assert!(rhythm.text.contains("similar heavy/light balance"));
    }

    #[test]
    fn test_hints_skip_missing_buckets() {
        let model = model();
        let bare = profile(NameEntry::new("Oona", ""));
        let hints = name_hints(&bare, Role::First, &model);
        assert!(hints.iter().all(|h| h.component != "head_transition"));
        assert!(hints.iter().all(|h| h.component != "rhythm"));
    }
}
