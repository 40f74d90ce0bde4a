use crate::error::{ParseError, Result};
use crate::node::Node;
use log::{debug, warn};
use metronome_core::{stratum, Meter, MetricalDuration, Structure, Tempo};

/// Most repetitions a single `"B/S x N"` element may ask for
pub const MAX_REPETITIONS: usize = 1 << 16;

/// Settings applied to every parse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParserOptions {
    /// Tempo used from the start of the score until the first declared tempo
    pub default_tempo: Tempo,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            default_tempo: Tempo::default(),
        }
    }
}

/// Parser turning a score document into a [`Structure`]
///
/// A score is a list whose elements are either meter strings (`"4/4"`,
/// `"3/8 x 4"`) or mappings keyed by a meter that carry tempo attributes:
///
/// ```text
/// - 4/4:
///   tempo_change: 30
/// - 3/4
/// - 5/4:
///   - 5:
///     tempo: 240
/// ```
///
/// The running offset, meters and tempo builder are reset by every call to
/// [`ScoreParser::parse`], so one parser can parse its score repeatedly.
#[derive(Debug, Clone)]
pub struct ScoreParser {
    score: Vec<Node>,
    options: ParserOptions,
    running_offset: MetricalDuration,
    /// Latest offset reached so far, over the finest subdivision seen
    horizon: MetricalDuration,
    meters: Vec<Meter>,
    tempi: stratum::Builder,
}

impl ScoreParser {
    /// Create a parser for `document`, which must be a list
    pub fn new(document: impl Into<Node>) -> Result<Self> {
        match document.into() {
            Node::List(score) => Ok(ScoreParser {
                score,
                options: ParserOptions::default(),
                running_offset: MetricalDuration::ZERO,
                horizon: MetricalDuration::ZERO,
                meters: Vec::new(),
                tempi: stratum::Builder::new(),
            }),
            other => Err(ParseError::IllFormedScore(other)),
        }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Meters accumulated by the last call to [`ScoreParser::parse`]
    pub fn meters(&self) -> &[Meter] {
        &self.meters
    }

    /// Parse a meter string such as `"7/8"`
    pub fn parse_meter(text: &str) -> Result<Meter> {
        parse_meter(text)
    }

    /// Walk the score and build its structure
    pub fn parse(&mut self) -> Result<Structure> {
        let default_tempo = self.options.default_tempo;
        if !default_tempo.is_respellable() {
            return Err(ParseError::IllFormedTempo(Node::Float(
                default_tempo.beats_per_minute(),
            )));
        }
        self.running_offset = MetricalDuration::ZERO;
        self.horizon = MetricalDuration::ZERO;
        self.meters.clear();
        self.tempi = stratum::Builder::new().with_default_tempo(default_tempo);

        let score = std::mem::take(&mut self.score);
        let result = score
            .iter()
            .try_for_each(|element| self.parse_element(element));
        self.score = score;
        result?;

        let tempi = std::mem::take(&mut self.tempi).build();
        debug!(
            "Parsed {} meters and {} tempo events",
            self.meters.len(),
            tempi.len()
        );
        Ok(Structure::new(self.meters.clone(), tempi))
    }

    fn parse_element(&mut self, element: &Node) -> Result<()> {
        debug!("Parsing {} at {}", element, self.running_offset);
        match element {
            Node::String(text) => {
                let (meter, count) = parse_repeated_meter(text)?;
                self.push_meter(meter, count, text)
            }
            Node::Mapping(entries) => {
                let (index, meter) = entries
                    .iter()
                    .enumerate()
                    .find_map(|(index, (key, _))| parse_meter(key).ok().map(|meter| (index, meter)))
                    .ok_or_else(|| ParseError::IllFormedScoreElement(element.clone()))?;

                let attributes = Attributes::collect(entries, index, element)
                    .ok_or_else(|| ParseError::IllFormedScoreElement(element.clone()))?;

                let downbeat = self.running_offset;
                if let Some((value, interpolating)) = attributes.tempo {
                    let tempo = extract_tempo(value, meter.subdivision())?;
                    self.tempi.add(tempo, downbeat, interpolating);
                }
                for nested in attributes.nested {
                    self.parse_nested(nested, meter, downbeat)?;
                }

                self.push_meter(meter, 1, &entries[index].0)
            }
            other => Err(ParseError::IllFormedScoreElement(other.clone())),
        }
    }

    /// Register the tempo declarations of a list of offset entries
    fn parse_nested(&mut self, declarations: &[Node], meter: Meter, base: MetricalDuration) -> Result<()> {
        for declaration in declarations {
            let ill_formed = || ParseError::IllFormedOffset(declaration.clone());
            let entries = declaration.as_mapping().ok_or_else(ill_formed)?;
            let (index, offset) = extract_offset(entries, meter, declaration)?;
            let attributes = Attributes::collect(entries, index, declaration).ok_or_else(ill_formed)?;
            let anchor = self.reach(base, offset).ok_or_else(ill_formed)?;

            if let Some((value, interpolating)) = attributes.tempo {
                let tempo = extract_tempo(value, meter.subdivision())?;
                self.tempi.add(tempo, anchor, interpolating);
            }
            // deeper lists count from this declaration's offset
            for nested in attributes.nested {
                self.parse_nested(nested, meter, anchor)?;
            }
        }
        Ok(())
    }

    /// Append `count` copies of `meter` and advance the running offset.
    /// `text` is the meter as written, for errors.
    fn push_meter(&mut self, meter: Meter, count: usize, text: &str) -> Result<()> {
        let ill_formed = || ParseError::IllFormedMeter(text.to_string());

        let beats = i64::try_from(count)
            .ok()
            .and_then(|count| meter.beats().checked_mul(count))
            .ok_or_else(ill_formed)?;
        let block = MetricalDuration::new(beats, meter.subdivision());
        self.running_offset = self.reach(self.running_offset, block).ok_or_else(ill_formed)?;
        self.meters.extend(std::iter::repeat(meter).take(count));
        Ok(())
    }

    /// `base + offset`, or `None` when the score would no longer fit in
    /// `i64` beats of its finest subdivision.
    fn reach(&mut self, base: MetricalDuration, offset: MetricalDuration) -> Option<MetricalDuration> {
        let end = base.checked_add(offset)?;
        let finest = self.horizon.subdivision().max(end.subdivision());
        let horizon = self.horizon.respelling(finest)?;
        self.horizon = horizon.max(end.respelling(finest)?);
        Some(end)
    }
}

/// Parse `document` with default options
pub fn parse_score(document: &Node) -> Result<Structure> {
    ScoreParser::new(document.clone())?.parse()
}

/// Parse a meter string of the form `beats/subdivision`
///
/// Besides a malformed split, non-integer parts or a subdivision that is not
/// a power of two, a beat count of zero or less is also rejected: such a
/// meter would have no duration.
pub fn parse_meter(text: &str) -> Result<Meter> {
    let ill_formed = || ParseError::IllFormedMeter(text.to_string());

    let (beats, subdivision) = text.split_once('/').ok_or_else(ill_formed)?;
    let beats: i64 = beats.parse().map_err(|_| ill_formed())?;
    let subdivision: i64 = subdivision.parse().map_err(|_| ill_formed())?;
    if beats <= 0 {
        return Err(ill_formed());
    }
    Meter::try_new(beats, subdivision).ok_or_else(ill_formed)
}

/// Parse `"B/S"` or `"B/S x N"`
fn parse_repeated_meter(text: &str) -> Result<(Meter, usize)> {
    let ill_formed = || ParseError::IllFormedMeter(text.to_string());

    let tokens: Vec<&str> = text.split(' ').collect();
    match tokens.as_slice() {
        [meter] => Ok((parse_meter(meter)?, 1)),
        [meter, "x", count] => {
            let count = count
                .parse::<usize>()
                .ok()
                .filter(|&count| count > 0 && count <= MAX_REPETITIONS)
                .ok_or_else(ill_formed)?;
            let meter = parse_meter(meter).map_err(|_| ill_formed())?;
            Ok((meter, count))
        }
        _ => Err(ill_formed()),
    }
}

/// The tempo and nested declarations attached to a meter or offset key
struct Attributes<'a> {
    /// Tempo value and whether it interpolates
    tempo: Option<(&'a Node, bool)>,
    nested: Vec<&'a [Node]>,
}

impl<'a> Attributes<'a> {
    /// Gather attributes from the siblings of `entries[key]` and from the
    /// key's own value. Returns `None` when the key's value is a scalar.
    fn collect(entries: &'a [(String, Node)], key: usize, owner: &Node) -> Option<Self> {
        let mut attributes = Attributes {
            tempo: None,
            nested: Vec::new(),
        };

        let siblings = entries
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != key)
            .map(|(_, entry)| entry);

        match &entries[key].1 {
            Node::Null => {}
            Node::List(declarations) => attributes.nested.push(declarations),
            Node::Mapping(inner) => attributes.add_all(inner.iter(), owner),
            _ => return None,
        }
        attributes.add_all(siblings, owner);
        Some(attributes)
    }

    fn add_all(&mut self, entries: impl Iterator<Item = &'a (String, Node)>, owner: &Node) {
        for (key, value) in entries {
            match (key.as_str(), value) {
                ("tempo", _) if self.tempo.is_none() => self.tempo = Some((value, false)),
                ("tempo_change", _) if self.tempo.is_none() => self.tempo = Some((value, true)),
                ("tempo" | "tempo_change", _) => warn!("Ignoring second tempo '{}' in {}", key, owner),
                (_, Node::List(declarations)) => self.nested.push(declarations),
                _ => warn!("Ignoring unknown attribute '{}' in {}", key, owner),
            }
        }
    }
}

/// Read a tempo in beats per minute, counted in `subdivision` notes.
///
/// The tempo must stay representable when respelled into any subdivision,
/// since ramps respell it into the subdivision of the next event.
fn extract_tempo(value: &Node, subdivision: i64) -> Result<Tempo> {
    let ill_formed = || ParseError::IllFormedTempo(value.clone());

    let beats_per_minute = match value {
        Node::Integer(n) => *n as f64,
        Node::Float(n) => *n,
        Node::String(s) => s.trim().parse::<f64>().map_err(|_| ill_formed())?,
        _ => return Err(ill_formed()),
    };
    Tempo::try_new(beats_per_minute, subdivision)
        .filter(Tempo::is_respellable)
        .ok_or_else(ill_formed)
}

/// Find the offset key of a nested declaration: a meter (its duration) or a
/// beat count in the enclosing meter's subdivision. First match wins.
fn extract_offset(
    entries: &[(String, Node)],
    meter: Meter,
    declaration: &Node,
) -> Result<(usize, MetricalDuration)> {
    for (index, (key, _)) in entries.iter().enumerate() {
        if let Ok(offset_meter) = parse_meter(key) {
            return Ok((index, offset_meter.metrical_duration()));
        }
        if let Ok(beats) = key.parse::<i64>() {
            if beats < 0 {
                return Err(ParseError::IllFormedOffset(declaration.clone()));
            }
            return Ok((index, MetricalDuration::new(beats, meter.subdivision())));
        }
    }
    Err(ParseError::IllFormedOffset(declaration.clone()))
}
