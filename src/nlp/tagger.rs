//! Lexicon and suffix-rule part-of-speech tagger for English prompts

use super::{PosTag, PosTagger, TaggedToken};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "some", "any", "no",
    "all", "both", "either", "neither", "another", "such", "what", "which", "whose", "my", "your",
    "his", "her", "its", "our", "their",
];

const PRONOUNS: &[&str] = &[
    "i", "me", "you", "he", "him", "she", "it", "we", "us", "they", "them", "myself", "yourself",
    "himself", "herself", "itself", "ourselves", "yourselves", "themselves", "mine", "yours",
    "hers", "ours", "theirs", "who", "whom", "something", "anything", "nothing", "everything",
    "someone", "anyone", "everyone", "nobody",
];

/// Pronouns that can be the subject of a following verb
const SUBJECT_PRONOUNS: &[&str] = &["i", "you", "he", "she", "it", "we", "they", "who"];

const ADPOSITIONS: &[&str] = &[
    "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "from", "up", "down", "of", "off", "over",
    "under", "within", "without", "along", "across", "behind", "beyond", "among", "around",
    "upon", "via", "per", "like", "than", "despite", "toward", "towards", "onto", "near",
];

const COORDINATORS: &[&str] = &["and", "or", "but", "nor", "plus"];

const SUBORDINATORS: &[&str] = &[
    "if", "because", "while", "although", "though", "unless", "whether", "whereas", "until",
];

const AUXILIARIES: &[&str] = &[
    "be", "am", "is", "are", "was", "were", "been", "being", "have", "has", "had", "having", "do",
    "does", "did", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
];

const PARTICLES: &[&str] = &["not"];

const ADVERBS: &[&str] = &[
    "very", "really", "just", "also", "only", "even", "still", "already", "always", "never",
    "often", "sometimes", "usually", "quite", "rather", "too", "so", "then", "there", "here",
    "now", "again", "almost", "perhaps", "maybe", "however", "therefore", "thus", "instead",
    "well", "soon", "later", "ever", "yet", "how", "why", "when", "where", "etc",
];

const ADJECTIVES: &[&str] = &[
    "good", "bad", "new", "old", "big", "small", "large", "short", "long", "high", "low", "clear",
    "concise", "brief", "detailed", "simple", "complex", "important", "main", "key", "best",
    "better", "different", "same", "other", "few", "many", "much", "more", "most", "less",
    "least", "several", "various", "possible", "available", "specific", "full", "whole", "own",
    "able", "easy", "hard", "first", "last", "next", "following", "previous", "current",
    "general", "common", "real", "major", "minor", "useful", "relevant", "necessary", "sure",
    "true", "false", "final", "additional", "similar", "certain", "likely", "free", "public",
    "private", "open", "top", "quick", "fast", "slow",
];

const INTERJECTIONS: &[&str] = &[
    "please", "yes", "oh", "hello", "hi", "thanks", "ok", "okay",
];

const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "twenty", "thirty", "forty", "fifty", "hundred", "thousand", "million",
    "billion",
];

/// Base forms of verbs common in instructions
const VERBS: &[&str] = &[
    "explain", "describe", "write", "list", "summarize", "summarise", "provide", "give", "make",
    "use", "create", "generate", "analyze", "analyse", "compare", "evaluate", "review",
    "identify", "outline", "discuss", "translate", "rewrite", "convert", "format", "fix",
    "improve", "optimize", "implement", "build", "design", "develop", "find", "show", "tell",
    "help", "consider", "include", "ensure", "keep", "avoid", "add", "remove", "check", "test",
    "answer", "respond", "return", "explore", "calculate", "define", "determine", "suggest",
    "recommend", "produce", "draft", "edit", "revise", "shorten", "expand", "focus",
    "highlight", "organize", "prepare", "present", "read", "understand", "know", "think",
    "need", "want", "try", "take", "get", "go", "come", "see", "look", "run", "call", "start",
    "stop", "change", "update", "apply", "follow", "assess", "estimate", "examine",
    "investigate", "interpret", "elaborate", "clarify", "illustrate", "demonstrate", "justify",
    "argue", "report", "plan", "structure", "rank", "sort", "filter", "group", "count", "mark",
    "note", "set", "map", "match", "search", "select", "output", "print", "display", "support",
    "process", "handle", "load", "save", "store", "share", "send", "receive", "reply", "deploy",
    "parse", "debug", "refactor", "compile", "install", "configure", "document", "detail",
    "specify", "emphasize", "mention", "state", "verify", "validate", "act", "work", "begin",
    "break", "bring", "choose", "draw", "speak", "say", "put", "let", "seem", "leave", "feel",
    "become", "allow", "require", "contain", "rate", "score", "measure", "name", "order",
    "limit", "comment", "release", "request", "result", "step", "point", "turn", "end",
    "claim", "view", "model", "guide", "lead", "train", "cover", "place", "schedule", "track",
    "log", "increase", "decrease", "drop", "shift", "move", "link", "post", "record", "query",
    "import", "export", "access", "control", "feature", "benefit", "impact", "experience",
    "address", "cost", "price", "sign", "type", "form",
];

/// Verbs whose base form is just as often a noun
const NOUN_VERBS: &[&str] = &[
    "list", "use", "review", "outline", "format", "fix", "design", "show", "help", "check",
    "test", "answer", "return", "draft", "edit", "focus", "highlight", "need", "want", "look",
    "run", "call", "start", "stop", "change", "update", "report", "plan", "structure", "rank",
    "sort", "filter", "group", "count", "mark", "note", "set", "map", "match", "search",
    "output", "print", "display", "support", "process", "handle", "load", "store", "share",
    "reply", "document", "detail", "state", "act", "work", "break", "draw", "rate", "score",
    "measure", "name", "order", "limit", "comment", "release", "request", "result", "step",
    "point", "turn", "end", "claim", "view", "model", "guide", "lead", "train", "cover",
    "place", "schedule", "track", "log", "increase", "decrease", "drop", "shift", "move",
    "link", "post", "record", "query", "import", "export", "access", "control", "feature",
    "benefit", "impact", "experience", "address", "cost", "price", "sign", "type", "form",
    "save", "estimate", "present", "try",
];

const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("wrote", "write"),
    ("written", "write"),
    ("made", "make"),
    ("gave", "give"),
    ("given", "give"),
    ("took", "take"),
    ("taken", "take"),
    ("got", "get"),
    ("gotten", "get"),
    ("found", "find"),
    ("thought", "think"),
    ("told", "tell"),
    ("kept", "keep"),
    ("left", "leave"),
    ("brought", "bring"),
    ("built", "build"),
    ("chose", "choose"),
    ("chosen", "choose"),
    ("drew", "draw"),
    ("drawn", "draw"),
    ("ran", "run"),
    ("sent", "send"),
    ("understood", "understand"),
    ("went", "go"),
    ("gone", "go"),
    ("came", "come"),
    ("saw", "see"),
    ("seen", "see"),
    ("knew", "know"),
    ("known", "know"),
    ("said", "say"),
    ("began", "begin"),
    ("begun", "begin"),
    ("broke", "break"),
    ("broken", "break"),
    ("shown", "show"),
    ("spoke", "speak"),
    ("spoken", "speak"),
    ("felt", "feel"),
    ("led", "lead"),
    ("became", "become"),
];

struct Lexicon {
    closed: HashMap<&'static str, PosTag>,
    verbs: HashSet<&'static str>,
    noun_verbs: HashSet<&'static str>,
    irregular: HashMap<&'static str, &'static str>,
}

static LEXICON: LazyLock<Lexicon> = LazyLock::new(|| {
    let mut closed = HashMap::new();
    // Later tables win on overlap, so the more specific classes come last.
    let tables: [(&[&str], PosTag); 11] = [
        (ADJECTIVES, PosTag::Adj),
        (ADVERBS, PosTag::Adv),
        (NUMBER_WORDS, PosTag::Num),
        (INTERJECTIONS, PosTag::Intj),
        (ADPOSITIONS, PosTag::Adp),
        (SUBORDINATORS, PosTag::Sconj),
        (COORDINATORS, PosTag::Cconj),
        (PARTICLES, PosTag::Part),
        (AUXILIARIES, PosTag::Aux),
        (PRONOUNS, PosTag::Pron),
        (DETERMINERS, PosTag::Det),
    ];
    for (words, tag) in tables {
        for word in words {
            closed.insert(*word, tag);
        }
    }

    Lexicon {
        closed,
        verbs: VERBS.iter().copied().collect(),
        noun_verbs: NOUN_VERBS.iter().copied().collect(),
        irregular: IRREGULAR_VERBS.iter().copied().collect(),
    }
});

/// How a verb form relates to its base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerbForm {
    Base,
    ThirdPerson,
    Past,
    Gerund,
}

/// Tagger built from closed-class word lists, a verb lexicon and
/// English suffix heuristics.
///
/// Unknown lower-case words default to NOUN and unknown capitalized words
/// inside a sentence to PROPN.
#[derive(Debug, Clone, Default)]
pub struct RuleTagger;

impl RuleTagger {
    pub fn new() -> Self {
        Self
    }

    fn tag_word(
        &self,
        word: &str,
        next: Option<&str>,
        history: &[(String, PosTag)],
        clause_start: bool,
    ) -> PosTag {
        let lex = &*LEXICON;
        let lower = word.to_lowercase();
        let prev = history.last().map(|(_, tag)| *tag);

        if is_punctuation(word) {
            return PosTag::Punct;
        }
        if is_symbol(word) {
            return PosTag::Sym;
        }
        if is_numeric(word) {
            return PosTag::Num;
        }
        if is_abbreviation(word) {
            return PosTag::Adv;
        }
        if let Some(host) = label_host(word) {
            return self.tag_word(host, next, history, clause_start);
        }

        match lower.as_str() {
            "n't" | "n’t" => return PosTag::Part,
            "'s" | "’s" => {
                return if prev == Some(PosTag::Pron) {
                    PosTag::Aux
                } else {
                    PosTag::Part
                }
            }
            "'re" | "'m" | "'ll" | "'d" | "'ve" | "’re" | "’m" | "’ll" | "’d" | "’ve" => {
                return PosTag::Aux
            }
            "to" => {
                let before_verb = next
                    .and_then(|n| resolve_verb(&n.to_lowercase()))
                    .map(|(_, form)| form == VerbForm::Base)
                    .unwrap_or(false);
                return if before_verb { PosTag::Part } else { PosTag::Adp };
            }
            _ => {}
        }

        if let Some(tag) = lex.closed.get(lower.as_str()) {
            return *tag;
        }

        if word.chars().any(|c| c.is_ascii_digit()) {
            return if word.chars().any(|c| c.is_uppercase()) {
                PosTag::Propn
            } else {
                PosTag::Noun
            };
        }

        if is_acronym(word) {
            return PosTag::Propn;
        }

        let capitalized = word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
        let verb = resolve_verb(&lower);
        if capitalized && !clause_start && verb.is_none() {
            return PosTag::Propn;
        }

        if let Some((base, form)) = verb {
            let verbal = clause_start || verb_context(history);
            let after_modifier = matches!(
                prev,
                Some(PosTag::Det) | Some(PosTag::Adj) | Some(PosTag::Adp) | Some(PosTag::Num)
            );
            return match form {
                VerbForm::Gerund if after_modifier => PosTag::Noun,
                VerbForm::Past if prev == Some(PosTag::Det) => PosTag::Adj,
                VerbForm::Past | VerbForm::Gerund => PosTag::Verb,
                VerbForm::Base | VerbForm::ThirdPerson if lex.noun_verbs.contains(base.as_str()) => {
                    if verbal && !after_modifier {
                        PosTag::Verb
                    } else {
                        PosTag::Noun
                    }
                }
                VerbForm::Base | VerbForm::ThirdPerson => PosTag::Verb,
            };
        }

        suffix_tag(&lower, prev)
    }
}

impl PosTagger for RuleTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        let raw = split_tokens(text);
        let mut history: Vec<(String, PosTag)> = Vec::with_capacity(raw.len());
        let mut tokens = Vec::with_capacity(raw.len());
        let mut clause_start = true;

        for (i, (offset, word)) in raw.iter().enumerate() {
            let next = raw.get(i + 1).map(|(_, w)| *w);
            let tag = self.tag_word(word, next, &history, clause_start);

            clause_start = match tag {
                PosTag::Punct => clause_start || matches!(*word, "." | "!" | "?" | ";" | ":"),
                PosTag::Intj | PosTag::Adv => clause_start,
                _ => false,
            };

            history.push((word.to_lowercase(), tag));
            tokens.push(TaggedToken::new(*word, tag, *offset));
        }

        tokens
    }
}

/// Whether the words before a candidate verb license a verbal reading
fn verb_context(history: &[(String, PosTag)]) -> bool {
    let mut iter = history
        .iter()
        .rev()
        .filter(|(_, tag)| *tag != PosTag::Adv);

    match iter.next() {
        None => true,
        Some((_, PosTag::Part)) | Some((_, PosTag::Aux)) | Some((_, PosTag::Intj)) => true,
        Some((word, PosTag::Pron)) => SUBJECT_PRONOUNS.contains(&word.as_str()),
        Some((_, PosTag::Cconj)) => matches!(iter.next(), Some((_, PosTag::Verb))),
        _ => false,
    }
}

/// Maps a lower-cased word to its verb base and inflection, if it is a
/// known verb form
fn resolve_verb(lower: &str) -> Option<(String, VerbForm)> {
    let lex = &*LEXICON;
    if lex.verbs.contains(lower) {
        return Some((lower.to_string(), VerbForm::Base));
    }
    if let Some(base) = lex.irregular.get(lower) {
        return Some((base.to_string(), VerbForm::Past));
    }

    let candidates = inflection_candidates(lower);
    candidates
        .into_iter()
        .find(|(base, _)| lex.verbs.contains(base.as_str()))
}

fn inflection_candidates(lower: &str) -> Vec<(String, VerbForm)> {
    let mut out = Vec::new();
    let strip = |suffix: &str| lower.strip_suffix(suffix).filter(|s| s.len() >= 2);

    if let Some(stem) = strip("ies") {
        out.push((format!("{stem}y"), VerbForm::ThirdPerson));
    }
    if let Some(stem) = strip("es") {
        out.push((stem.to_string(), VerbForm::ThirdPerson));
    }
    if let Some(stem) = strip("s") {
        if !stem.ends_with('s') {
            out.push((stem.to_string(), VerbForm::ThirdPerson));
        }
    }
    if let Some(stem) = strip("ied") {
        out.push((format!("{stem}y"), VerbForm::Past));
    }
    if let Some(stem) = strip("ed") {
        out.push((stem.to_string(), VerbForm::Past));
        out.push((format!("{stem}e"), VerbForm::Past));
        if let Some(undoubled) = undouble(stem) {
            out.push((undoubled, VerbForm::Past));
        }
    }
    if let Some(stem) = strip("ing") {
        out.push((stem.to_string(), VerbForm::Gerund));
        out.push((format!("{stem}e"), VerbForm::Gerund));
        if let Some(undoubled) = undouble(stem) {
            out.push((undoubled, VerbForm::Gerund));
        }
    }

    out
}

/// "stopp" -> "stop"
fn undouble(stem: &str) -> Option<String> {
    let mut chars = stem.chars().rev();
    let last = chars.next()?;
    let before = chars.next()?;
    (last == before && !"aeiou".contains(last)).then(|| stem[..stem.len() - last.len_utf8()].to_string())
}

fn suffix_tag(lower: &str, prev: Option<PosTag>) -> PosTag {
    if lower.len() < 4 {
        return PosTag::Noun;
    }
    if lower.ends_with("ly") {
        return PosTag::Adv;
    }
    if lower.ends_with("ing") {
        return match prev {
            Some(PosTag::Det) | Some(PosTag::Adj) | Some(PosTag::Adp) => PosTag::Noun,
            _ => PosTag::Verb,
        };
    }
    if lower.ends_with("ed") {
        return if prev == Some(PosTag::Det) {
            PosTag::Adj
        } else {
            PosTag::Verb
        };
    }
    if ["ize", "ise", "ify"].iter().any(|s| lower.ends_with(s)) {
        return PosTag::Verb;
    }
    const ADJ_SUFFIXES: &[&str] = &[
        "ous", "ful", "ive", "able", "ible", "ical", "ional", "less", "ish", "istic",
    ];
    if ADJ_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return PosTag::Adj;
    }
    PosTag::Noun
}

fn is_punct_char(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | ';' | ':' | '!' | '?' | '"' | '\'' | '(' | ')' | '[' | ']' | '{' | '}' | '-'
            | '–' | '—' | '…' | '“' | '”' | '‘' | '’'
    )
}

fn is_opening(c: char) -> bool {
    matches!(c, '"' | '\'' | '(' | '[' | '{' | '“' | '‘')
}

fn is_trailing(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | ';' | ':' | '!' | '?' | '"' | '\'' | ')' | ']' | '}' | '…' | '”' | '’'
    )
}

fn is_punctuation(word: &str) -> bool {
    !word.is_empty() && word.chars().all(is_punct_char)
}

fn is_symbol(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

fn is_numeric(word: &str) -> bool {
    let body = word.strip_prefix(['-', '+']).unwrap_or(word);
    body.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false)
        && body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

fn is_acronym(word: &str) -> bool {
    word.chars().count() >= 2
        && word.chars().all(|c| c.is_alphabetic())
        && word.chars().all(|c| c.is_uppercase())
}

/// Dotted abbreviations such as "e.g." or "U.S."
fn is_abbreviation(word: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();
    chars.len() >= 4
        && chars.len() % 2 == 0
        && chars
            .chunks(2)
            .all(|pair| pair[0].is_alphabetic() && pair[1] == '.')
}

/// Colon-terminated labels such as "JSON:" or "ex:" stay whole; returns the
/// word before the colon.
fn label_host(word: &str) -> Option<&str> {
    let host = word.strip_suffix(':')?;
    (!host.is_empty()
        && host.chars().all(|c| c.is_alphanumeric())
        && host.chars().any(|c| c.is_alphabetic()))
    .then_some(host)
}

const CLITICS: &[&str] = &[
    "n't", "'s", "'re", "'ll", "'ve", "'d", "'m", "n’t", "’s", "’re", "’ll", "’ve", "’d", "’m",
];

/// Splits text into (byte offset, token) pairs.
///
/// Whitespace separates chunks; opening punctuation, trailing punctuation
/// and clitics are split off each chunk. Dotted abbreviations, labels and
/// slash or hyphen compounds are kept whole.
pub(crate) fn split_tokens(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                split_chunk(&text[s..i], s, &mut out);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        split_chunk(&text[s..], s, &mut out);
    }

    out
}

fn split_chunk<'a>(chunk: &'a str, base: usize, out: &mut Vec<(usize, &'a str)>) {
    if is_abbreviation(chunk) || label_host(chunk).is_some() || is_punctuation(chunk) {
        out.push((base, chunk));
        return;
    }

    let mut core = chunk;
    let mut offset = base;

    while let Some(c) = core.chars().next() {
        if !is_opening(c) || core.len() == c.len_utf8() {
            break;
        }
        out.push((offset, &core[..c.len_utf8()]));
        core = &core[c.len_utf8()..];
        offset += c.len_utf8();
    }

    let mut trailing = Vec::new();
    while let Some(c) = core.chars().next_back() {
        if is_abbreviation(core) || !is_trailing(c) || core.len() == c.len_utf8() {
            break;
        }
        let cut = core.len() - c.len_utf8();
        trailing.push((offset + cut, &core[cut..]));
        core = &core[..cut];
    }

    let clitic_cut = CLITICS.iter().find_map(|cl| {
        let cut = core.len().checked_sub(cl.len()).filter(|cut| *cut > 0)?;
        (core.is_char_boundary(cut) && core[cut..].to_lowercase() == *cl).then_some(cut)
    });
    match clitic_cut {
        Some(cut) => {
            out.push((offset, &core[..cut]));
            out.push((offset + cut, &core[cut..]));
        }
        None if !core.is_empty() => out.push((offset, core)),
        None => {}
    }

    out.extend(trailing.into_iter().rev());
}
