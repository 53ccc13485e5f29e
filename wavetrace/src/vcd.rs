// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License

use crate::bitvec::{BitVector, LogicState};
use crate::hierarchy::{NetRef, TraceBuilder};
use crate::{LoadOptions, Time};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use std::io::BufRead;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum VcdParseError {
    #[error("[vcd] line {line}: unexpected end of file")]
    UnexpectedEof { line: u64 },
    #[error("[vcd] line {line}: parse error, expected `{expected}` got `{found}`")]
    Expected {
        line: u64,
        expected: &'static str,
        found: String,
    },
    #[error("[vcd] line {line}: `$end` without a matching command")]
    UnmatchedEnd { line: u64 },
    #[error("[vcd] line {line}: expected command to start with `$`, not `{token}`")]
    UnexpectedToken { line: u64, token: String },
    #[error("[vcd] line {line}: `$upscope` without a matching `$scope`")]
    UnbalancedUpscope { line: u64 },
    #[error("[vcd] line {line}: unknown timescale value `{value}`, valid units are: s, ms, us, ns")]
    UnknownTimescaleUnit { line: u64, value: String },
    #[error("[vcd] line {line}: invalid timescale `{value}`")]
    InvalidTimescale { line: u64, value: String },
    #[error("[vcd] line {line}: unexpected number of tokens for command {cmd}: {tokens}")]
    UnexpectedNumberOfTokens {
        line: u64,
        cmd: &'static str,
        tokens: String,
    },
    #[error("[vcd] line {line}: failed to parse length: `{value}` for variable `{name}`")]
    InvalidVarWidth {
        line: u64,
        value: String,
        name: String,
    },
    #[error("[vcd] line {line}: net `{name}` is declared twice in the same scope")]
    DuplicateNetName { line: u64, name: String },
    #[error("[vcd] line {line}: unknown net id `{id}`")]
    UnknownNetId { line: u64, id: String },
    #[error("[vcd] line {line}: invalid logic value `{value}`")]
    InvalidLogicValue { line: u64, value: String },
    #[error("[vcd] line {line}: failed to parse timestamp `{value}`")]
    InvalidTimestamp { line: u64, value: String },
    #[error("I/O operation failed")]
    Io(#[from] std::io::Error),
}

impl VcdParseError {
    /// Line (starting at 1) on which the error was detected. `None` for I/O errors.
    pub fn line(&self) -> Option<u64> {
        use VcdParseError::*;
        match self {
            UnexpectedEof { line }
            | Expected { line, .. }
            | UnmatchedEnd { line }
            | UnexpectedToken { line, .. }
            | UnbalancedUpscope { line }
            | UnknownTimescaleUnit { line, .. }
            | InvalidTimescale { line, .. }
            | UnexpectedNumberOfTokens { line, .. }
            | InvalidVarWidth { line, .. }
            | DuplicateNetName { line, .. }
            | UnknownNetId { line, .. }
            | InvalidLogicValue { line, .. }
            | InvalidTimestamp { line, .. } => Some(*line),
            Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VcdParseError>;

/// Summary of a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadStats {
    /// Declared nets, including aliases.
    pub nets: usize,
    /// Distinct VCD identifiers, i.e. nets with their own value history.
    pub ids: usize,
    /// Value changes appended to the trace.
    pub transitions: u64,
}

/// Streams a VCD into a [`TraceBuilder`].
#[derive(Debug, Clone, Default)]
pub struct VcdLoader {
    options: LoadOptions,
}

impl VcdLoader {
    pub fn new(options: &LoadOptions) -> Self {
        Self { options: *options }
    }

    /// Parses the header and then all value changes. On error the builder is left with
    /// partial contents which should be discarded.
    pub fn load<R: BufRead, B: TraceBuilder + ?Sized>(
        &self,
        input: R,
        builder: &mut B,
    ) -> Result<LoadStats> {
        let mut parser = Parser::new(input, builder, self.options.default_timescale_ns);
        while parser.parse_definition()? {}
        while parser.parse_transition()? {}
        parser.builder.load_finished();

        let stats = LoadStats {
            nets: parser.nets,
            ids: parser.id_map.len(),
            transitions: parser.transitions,
        };
        info!(
            "parsed {} total transitions, {} total nets ({} unique)",
            stats.transitions, stats.nets, stats.ids
        );
        Ok(stats)
    }
}

/// Splits the input into whitespace separated tokens and keeps track of line numbers.
struct Tokenizer<R: BufRead> {
    input: R,
    /// line of the next byte to be read
    line: u64,
    token: Vec<u8>,
    token_line: u64,
}

impl<R: BufRead> Tokenizer<R> {
    fn new(input: R) -> Self {
        Self {
            input,
            line: 1,
            token: Vec::with_capacity(64),
            token_line: 1,
        }
    }

    /// Advances to the next token. Returns false at the end of the input.
    fn next_token(&mut self) -> std::io::Result<bool> {
        self.token.clear();
        loop {
            let buf = self.input.fill_buf()?;
            if buf.is_empty() {
                return Ok(!self.token.is_empty());
            }
            let mut used = 0;
            let mut done = false;
            for &b in buf {
                used += 1;
                if is_white_space(b) {
                    if b == b'\n' {
                        self.line += 1;
                    }
                    if !self.token.is_empty() {
                        done = true;
                        break;
                    }
                } else {
                    if self.token.is_empty() {
                        self.token_line = self.line;
                    }
                    self.token.push(b);
                }
            }
            self.input.consume(used);
            if done {
                return Ok(true);
            }
        }
    }

    /// Like `next_token` but treats the end of the input as an error.
    fn require_token(&mut self) -> Result<()> {
        if self.next_token()? {
            Ok(())
        } else {
            Err(VcdParseError::UnexpectedEof { line: self.line })
        }
    }

    #[inline]
    fn token(&self) -> &[u8] {
        &self.token
    }

    /// Line on which the current token starts.
    #[inline]
    fn line(&self) -> u64 {
        self.token_line
    }
}

#[inline]
fn is_white_space(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t')
}

#[inline]
fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

#[derive(Debug, PartialEq, Copy, Clone)]
enum HeaderCmd {
    Scope,
    UpScope,
    Var,
    Timescale,
    EndDefinitions,
    End,
    /// `$date`, `$version`, `$comment` and anything else we do not interpret
    Other,
}

impl HeaderCmd {
    fn from_bytes(token: &[u8]) -> Option<Self> {
        match token {
            b"$scope" => Some(HeaderCmd::Scope),
            b"$upscope" => Some(HeaderCmd::UpScope),
            b"$var" => Some(HeaderCmd::Var),
            b"$timescale" => Some(HeaderCmd::Timescale),
            b"$enddefinitions" => Some(HeaderCmd::EndDefinitions),
            b"$end" => Some(HeaderCmd::End),
            other if other.first() == Some(&b'$') => Some(HeaderCmd::Other),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
enum BodyToken {
    Time,
    ScalarValue,
    VectorValue,
    CommentStart,
    IgnoredCmd,
}

impl BodyToken {
    fn classify(token: &[u8]) -> Self {
        match token {
            b"$dumpvars" | b"$dumpall" | b"$dumpon" | b"$dumpoff" | b"$end" => {
                BodyToken::IgnoredCmd
            }
            b"$comment" => BodyToken::CommentStart,
            [b'#', ..] => BodyToken::Time,
            [b'b' | b'B', ..] => BodyToken::VectorValue,
            _ => BodyToken::ScalarValue,
        }
    }
}

struct Parser<'a, R: BufRead, B: TraceBuilder + ?Sized> {
    tokens: Tokenizer<R>,
    builder: &'a mut B,
    /// VCD identifier to the first net declared with it
    id_map: FxHashMap<Vec<u8>, NetRef>,
    ns_per_tick: u64,
    /// one entry per open `$scope`, false if it had no name and was not entered
    open_scopes: Vec<bool>,
    current_time: Time,
    nets: usize,
    transitions: u64,
    /// value characters of the change that is being decoded
    value_chars: Vec<u8>,
    value: BitVector,
}

impl<'a, R: BufRead, B: TraceBuilder + ?Sized> Parser<'a, R, B> {
    fn new(input: R, builder: &'a mut B, ns_per_tick: u64) -> Self {
        Self {
            tokens: Tokenizer::new(input),
            builder,
            id_map: FxHashMap::default(),
            ns_per_tick,
            open_scopes: Vec::new(),
            current_time: 0,
            nets: 0,
            transitions: 0,
            value_chars: Vec::with_capacity(64),
            value: BitVector::default(),
        }
    }

    /// Returns false once `$enddefinitions $end` was consumed.
    fn parse_definition(&mut self) -> Result<bool> {
        self.tokens.require_token()?;
        let line = self.tokens.line();
        let cmd = HeaderCmd::from_bytes(self.tokens.token()).ok_or_else(|| {
            VcdParseError::UnexpectedToken {
                line,
                token: lossy(self.tokens.token()),
            }
        })?;
        match cmd {
            HeaderCmd::Scope => self.parse_scope(line)?,
            HeaderCmd::UpScope => self.parse_upscope(line)?,
            HeaderCmd::Var => self.parse_var(line)?,
            HeaderCmd::Timescale => self.parse_timescale(line)?,
            HeaderCmd::EndDefinitions => {
                self.expect_end()?;
                debug!("definitions end on line {line}, {} nets", self.nets);
                return Ok(false);
            }
            HeaderCmd::End => return Err(VcdParseError::UnmatchedEnd { line }),
            HeaderCmd::Other => {
                debug!("skipping `{}` on line {line}", lossy(self.tokens.token()));
                self.read_block()?;
            }
        }
        Ok(true)
    }

    /// Collects all tokens up to the next `$end`.
    fn read_block(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut body = Vec::new();
        loop {
            self.tokens.require_token()?;
            if self.tokens.token() == b"$end" {
                return Ok(body);
            }
            body.push(self.tokens.token().to_vec());
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        self.tokens.require_token()?;
        if self.tokens.token() == b"$end" {
            Ok(())
        } else {
            Err(VcdParseError::Expected {
                line: self.tokens.line(),
                expected: "$end",
                found: lossy(self.tokens.token()),
            })
        }
    }

    fn parse_scope(&mut self, line: u64) -> Result<()> {
        let body = self.read_block()?;
        // `$scope <type> <name> $end`, some tools omit the name
        let name = match body.as_slice() {
            [_tpe] => String::new(),
            [_tpe, name] => lossy(name),
            other => return Err(unexpected_n_tokens(line, "scope", other)),
        };
        // nets of an unnamed scope go into the enclosing scope
        let entered = !name.is_empty();
        if entered {
            self.builder.enter_module(&name);
        } else {
            debug!("line {line}: flattening scope without a name");
        }
        self.open_scopes.push(entered);
        Ok(())
    }

    fn parse_upscope(&mut self, line: u64) -> Result<()> {
        self.expect_end()?;
        match self.open_scopes.pop() {
            None => Err(VcdParseError::UnbalancedUpscope { line }),
            Some(entered) => {
                if entered {
                    self.builder.exit_module();
                }
                Ok(())
            }
        }
    }

    fn parse_var(&mut self, line: u64) -> Result<()> {
        let body = self.read_block()?;
        // `$var <type> <size> <id> <name> [<range>] $end`
        if body.len() < 4 {
            return Err(unexpected_n_tokens(line, "variable", &body));
        }
        let name = strip_range(&lossy(&body[3])).to_string();
        let width = std::str::from_utf8(&body[1])
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| VcdParseError::InvalidVarWidth {
                line,
                value: lossy(&body[1]),
                name: name.clone(),
            })?;
        // a zero length net is represented with a single bit
        let width = std::cmp::max(width, 1);

        if self.builder.has_net(&name) {
            return Err(VcdParseError::DuplicateNetName { line, name });
        }

        let id = &body[2];
        match self.id_map.get(id.as_slice()) {
            Some(&existing) => {
                // shares its value history with the net that was declared first
                self.builder.new_net(&name, Some(existing), width);
            }
            None => {
                let net = self.builder.new_net(&name, None, width);
                self.id_map.insert(id.clone(), net);
            }
        }
        self.nets += 1;
        Ok(())
    }

    fn parse_timescale(&mut self, line: u64) -> Result<()> {
        // accepts `1ns` as well as `1 ns`
        let value = lossy(&self.read_block()?.concat());
        let ns_per_tick = parse_timescale(&value).map_err(|kind| match kind {
            TimescaleError::Unit => VcdParseError::UnknownTimescaleUnit {
                line,
                value: value.clone(),
            },
            TimescaleError::Magnitude => VcdParseError::InvalidTimescale {
                line,
                value: value.clone(),
            },
        })?;
        debug!("timescale `{value}` is {ns_per_tick} ns per tick");
        self.ns_per_tick = ns_per_tick;
        self.builder.set_timescale(ns_per_tick);
        Ok(())
    }

    /// Returns false at the end of the input.
    fn parse_transition(&mut self) -> Result<bool> {
        if !self.tokens.next_token()? {
            return Ok(false);
        }
        let line = self.tokens.line();
        match BodyToken::classify(self.tokens.token()) {
            BodyToken::Time => self.time_change(line)?,
            BodyToken::IgnoredCmd => {}
            BodyToken::CommentStart => {
                self.read_block()?;
            }
            BodyToken::VectorValue => {
                // value first, then a space, then the identifier
                self.value_chars.clear();
                self.value_chars
                    .extend_from_slice(&self.tokens.token()[1..]);
                self.tokens.require_token()?;
                self.value_change(line, 0)?;
            }
            BodyToken::ScalarValue => {
                // single value character directly followed by the identifier
                self.value_chars.clear();
                self.value_chars.push(self.tokens.token()[0]);
                self.value_change(line, 1)?;
            }
        }
        Ok(true)
    }

    fn time_change(&mut self, line: u64) -> Result<()> {
        let token = self.tokens.token();
        let time = parse_time(&token[1..])
            .and_then(|ticks| ticks.checked_mul(self.ns_per_tick))
            .ok_or_else(|| VcdParseError::InvalidTimestamp {
                line,
                value: lossy(token),
            })?;
        if time < self.current_time {
            // our transition vectors can only be appended to
            warn!(
                "line {line}: ignoring time step back from {} to {time}",
                self.current_time
            );
        } else {
            self.current_time = time;
        }
        Ok(())
    }

    /// The identifier is the current token starting at `id_start`.
    fn value_change(&mut self, line: u64, id_start: usize) -> Result<()> {
        let id = &self.tokens.token()[id_start..];
        let net = match self.id_map.get(id) {
            Some(&net) => net,
            None => {
                return Err(VcdParseError::UnknownNetId {
                    line: self.tokens.line(),
                    id: lossy(id),
                })
            }
        };
        let width = self.builder.net_width(net);
        if !decode_value(&self.value_chars, width, &mut self.value) {
            return Err(VcdParseError::InvalidLogicValue {
                line,
                value: lossy(&self.value_chars),
            });
        }
        self.builder
            .append_transition(net, self.current_time, &self.value);
        self.transitions += 1;
        Ok(())
    }
}

#[inline]
fn unexpected_n_tokens(line: u64, cmd: &'static str, tokens: &[Vec<u8>]) -> VcdParseError {
    VcdParseError::UnexpectedNumberOfTokens {
        line,
        cmd,
        tokens: tokens
            .iter()
            .map(|t| String::from_utf8_lossy(t))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Removes a bit range like `[7:0]` from the end of a net name.
fn strip_range(name: &str) -> &str {
    match name.find('[') {
        Some(pos) if pos > 0 => name[..pos].trim_end(),
        _ => name,
    }
}

#[derive(Debug, PartialEq, Copy, Clone)]
enum TimescaleError {
    Unit,
    Magnitude,
}

/// Converts a timescale like `10us` into nanoseconds per tick.
fn parse_timescale(value: &str) -> std::result::Result<u64, TimescaleError> {
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (magnitude, unit) = value.split_at(split);
    let unit_ns: u64 = match unit {
        "s" => 1_000_000_000,
        "ms" => 1_000_000,
        "us" => 1_000,
        "ns" => 1,
        _ => return Err(TimescaleError::Unit),
    };
    let magnitude = magnitude
        .parse::<u64>()
        .map_err(|_| TimescaleError::Magnitude)?;
    if magnitude == 0 {
        return Err(TimescaleError::Magnitude);
    }
    magnitude
        .checked_mul(unit_ns)
        .ok_or(TimescaleError::Magnitude)
}

/// Parses the digits after `#`. Values like `12.0` are accepted if they have no fractional part.
fn parse_time(digits: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(digits).ok()?;
    match text.parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            let value = text.parse::<f64>().ok()?;
            if value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64 {
                Some(value as u64)
            } else {
                None
            }
        }
    }
}

/// Decodes the value of a change record for a net of `width` bits into `out`.
///
/// A single `x` or `z` is applied to all bits. Otherwise the last character maps to bit 0
/// and missing leading bits are zero. Characters beyond `width` are dropped.
/// Returns false if a character is not a valid logic value.
fn decode_value(value: &[u8], width: u32, out: &mut BitVector) -> bool {
    if let [single] = value {
        if width > 1 {
            match LogicState::from_ascii(*single) {
                Some(state @ (LogicState::X | LogicState::Z)) => {
                    out.reset(width, state);
                    return true;
                }
                Some(_) => {}
                None => return false,
            }
        }
    }
    out.reset(width, LogicState::Zero);
    for (ii, c) in value.iter().rev().enumerate() {
        let Some(state) = LogicState::from_ascii(*c) else {
            return false;
        };
        if ii < width as usize {
            out.set_digit(ii as u32, state);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every builder call as a string.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        widths: Vec<u32>,
    }

    impl TraceBuilder for Recorder {
        fn enter_module(&mut self, name: &str) {
            self.calls.push(format!("enter({name})"));
        }

        fn exit_module(&mut self) {
            self.calls.push("exit".to_string());
        }

        fn new_net(&mut self, short_name: &str, alias_of: Option<NetRef>, width: u32) -> NetRef {
            let net = NetRef::from_index(self.widths.len()).unwrap();
            match alias_of {
                None => {
                    self.calls.push(format!("net({short_name}, {width})"));
                    self.widths.push(width);
                }
                Some(other) => {
                    self.calls
                        .push(format!("net({short_name}, alias {})", other.index()));
                    self.widths.push(self.widths[other.index()]);
                }
            }
            net
        }

        fn net_width(&self, net: NetRef) -> u32 {
            self.widths[net.index()]
        }

        fn append_transition(&mut self, net: NetRef, timestamp: Time, value: &BitVector) {
            self.calls
                .push(format!("{}@{timestamp} = {value}", net.index()));
        }

        fn set_timescale(&mut self, ns_per_tick: u64) {
            self.calls.push(format!("timescale({ns_per_tick})"));
        }

        fn load_finished(&mut self) {
            self.calls.push("finished".to_string());
        }
    }

    fn load(input: &str) -> Result<(Vec<String>, LoadStats)> {
        let mut recorder = Recorder::default();
        let stats = VcdLoader::default().load(input.as_bytes(), &mut recorder)?;
        Ok((recorder.calls, stats))
    }

    #[test]
    fn test_tokenizer() {
        let input = b" $scope \t module\r\ntop $end\n\n#10\n";
        let mut tokens = Tokenizer::new(input.as_slice());
        let mut out = Vec::new();
        while tokens.next_token().unwrap() {
            out.push((lossy(tokens.token()), tokens.line()));
        }
        let expected: [(&str, u64); 5] = [
            ("$scope", 1),
            ("module", 1),
            ("top", 2),
            ("$end", 2),
            ("#10", 4),
        ];
        let expected: Vec<_> = expected
            .iter()
            .map(|(t, l)| (t.to_string(), *l))
            .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_load() {
        let input = r#"
$date today $end
$timescale 1ns $end
$scope module top $end
$var wire 1 ! clk $end
$var wire 4 " data [3:0] $end
$scope module sub $end
$var wire 1 ! clk_in $end
$upscope $end
$upscope $end
$enddefinitions $end
$dumpvars
0!
bx "
$end
#10
1!
b101 "
#20
0!
bz "
"#;
        let (calls, stats) = load(input).unwrap();
        let expected = [
            "timescale(1)",
            "enter(top)",
            "net(clk, 1)",
            "net(data, 4)",
            "enter(sub)",
            "net(clk_in, alias 0)",
            "exit",
            "exit",
            "0@0 = 0",
            "1@0 = xxxx",
            "0@10 = 1",
            "1@10 = 0101",
            "0@20 = 0",
            "1@20 = zzzz",
            "finished",
        ];
        assert_eq!(calls, expected);
        assert_eq!(
            stats,
            LoadStats {
                nets: 3,
                ids: 2,
                transitions: 6
            }
        );
    }

    #[test]
    fn test_timescale_is_applied() {
        let input = "$timescale 10 us $end $scope module m $end $var reg 1 # r $end $upscope $end \
                     $enddefinitions $end #3 1#";
        let (calls, _) = load(input).unwrap();
        assert_eq!(calls[0], "timescale(10000)");
        assert!(calls.contains(&"0@30000 = 1".to_string()));
    }

    #[test]
    fn test_parse_timescale() {
        assert_eq!(parse_timescale("1ns"), Ok(1));
        assert_eq!(parse_timescale("100ns"), Ok(100));
        assert_eq!(parse_timescale("10us"), Ok(10_000));
        assert_eq!(parse_timescale("1ms"), Ok(1_000_000));
        assert_eq!(parse_timescale("1s"), Ok(1_000_000_000));
        assert_eq!(parse_timescale("1ps"), Err(TimescaleError::Unit));
        assert_eq!(parse_timescale("1fs"), Err(TimescaleError::Unit));
        assert_eq!(parse_timescale("1"), Err(TimescaleError::Unit));
        assert_eq!(parse_timescale("ns"), Err(TimescaleError::Magnitude));
        assert_eq!(parse_timescale("0ns"), Err(TimescaleError::Magnitude));
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time(b"0"), Some(0));
        assert_eq!(parse_time(b"2678437829"), Some(2678437829));
        assert_eq!(parse_time(b"12.0"), Some(12));
        assert_eq!(parse_time(b"12.5"), None);
        assert_eq!(parse_time(b"abc"), None);
        assert_eq!(parse_time(b""), None);
    }

    fn decode(value: &str, width: u32) -> Option<String> {
        let mut out = BitVector::default();
        decode_value(value.as_bytes(), width, &mut out).then(|| out.to_string())
    }

    #[test]
    fn test_decode_value() {
        assert_eq!(decode("1", 1).unwrap(), "1");
        assert_eq!(decode("z", 1).unwrap(), "z");
        assert_eq!(decode("x", 4).unwrap(), "xxxx");
        assert_eq!(decode("Z", 3).unwrap(), "zzz");
        // short values are zero extended
        assert_eq!(decode("1", 4).unwrap(), "0001");
        assert_eq!(decode("x1", 4).unwrap(), "00x1");
        assert_eq!(decode("1010", 4).unwrap(), "1010");
        // extra leading characters are dropped
        assert_eq!(decode("11010", 4).unwrap(), "1010");
        assert_eq!(decode("", 2).unwrap(), "00");
        assert!(decode("12", 2).is_none());
        assert!(decode("u", 4).is_none());
        assert!(decode("h", 1).is_none());
    }

    #[test]
    fn test_strip_range() {
        assert_eq!(strip_range("data"), "data");
        assert_eq!(strip_range("data[7:0]"), "data");
        assert_eq!(strip_range("data [7:0]"), "data");
        assert_eq!(strip_range("[0]"), "[0]");
    }

    fn load_err(input: &str) -> VcdParseError {
        match load(input) {
            Ok(_) => panic!("expected an error for {input:?}"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_unknown_timescale_unit() {
        // reported on the line of the `$timescale` command
        let err = load_err("$timescale\n 1ps\n $end\n$enddefinitions $end\n");
        assert!(matches!(
            err,
            VcdParseError::UnknownTimescaleUnit { line: 1, .. }
        ));
        assert!(err.to_string().contains("1ps"));
    }

    #[test]
    fn test_unknown_net_id() {
        let input = "$var wire 1 ! a $end\n$enddefinitions $end\n#0\n1!\n1?\n";
        let err = load_err(input);
        assert!(matches!(err, VcdParseError::UnknownNetId { line: 5, ref id } if id == "?"));
        assert_eq!(err.line(), Some(5));
    }

    #[test]
    fn test_unknown_vector_net_id() {
        let input = "$var wire 2 ! a $end\n$enddefinitions $end\nb10\n  %\n";
        let err = load_err(input);
        assert!(matches!(err, VcdParseError::UnknownNetId { line: 4, ref id } if id == "%"));
    }

    #[test]
    fn test_invalid_logic_value() {
        let input = "$var wire 4 ! a $end\n$enddefinitions $end\n#0\nb10u1 !\n";
        let err = load_err(input);
        assert!(matches!(err, VcdParseError::InvalidLogicValue { line: 4, .. }));
    }

    #[test]
    fn test_unexpected_eof() {
        let err = load_err("$scope module top $end\n$var wire 1 ! a");
        assert!(matches!(err, VcdParseError::UnexpectedEof { line: 2 }));
        let err = load_err("$scope module top $end\n");
        assert!(matches!(err, VcdParseError::UnexpectedEof { .. }));
        // vector value without an id
        let err = load_err("$var wire 2 ! a $end $enddefinitions $end b10");
        assert!(matches!(err, VcdParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            load_err("$end\n"),
            VcdParseError::UnmatchedEnd { line: 1 }
        ));
        assert!(matches!(
            load_err("\n$upscope $end\n"),
            VcdParseError::UnbalancedUpscope { line: 2 }
        ));
        assert!(matches!(
            load_err("$upscope foo $end"),
            VcdParseError::Expected { expected: "$end", .. }
        ));
        assert!(matches!(
            load_err("$enddefinitions foo $end"),
            VcdParseError::Expected { .. }
        ));
        assert!(matches!(
            load_err("module top $end"),
            VcdParseError::UnexpectedToken { .. }
        ));
        assert!(matches!(
            load_err("$var wire 1 ! $end"),
            VcdParseError::UnexpectedNumberOfTokens { cmd: "variable", .. }
        ));
        assert!(matches!(
            load_err("$var wire one ! a $end"),
            VcdParseError::InvalidVarWidth { .. }
        ));
        assert!(matches!(
            load_err("$var wire 1 ! a $end $enddefinitions $end #1a"),
            VcdParseError::InvalidTimestamp { .. }
        ));
    }

    fn load_model(input: &str) -> Result<crate::TraceDataModel> {
        let mut model = crate::TraceDataModel::new();
        VcdLoader::default().load(input.as_bytes(), &mut model.start_building())?;
        Ok(model)
    }

    #[test]
    fn test_duplicate_net_name_in_merged_scope() {
        let input = "$scope module t $end\n$var wire 1 ! a $end\n$upscope $end\n\
                     $scope module t $end\n$var wire 4 # a $end\n$upscope $end\n\
                     $enddefinitions $end\n";
        match load_model(input) {
            Err(VcdParseError::DuplicateNetName { line, name }) => {
                assert_eq!(line, 5);
                assert_eq!(name, "a");
            }
            other => panic!("expected a duplicate name error, got {other:?}"),
        }
    }

    #[test]
    fn test_same_short_name_in_different_scopes() {
        let input = "$scope module t $end $var wire 1 ! a $end $upscope $end \
                     $scope module u $end $var wire 1 ! a $end $upscope $end \
                     $enddefinitions $end #1 1!";
        let model = load_model(input).unwrap();
        assert_eq!(model.net_count(), 2);
        let ta = model.find_net("t.a").unwrap();
        let ua = model.find_net("u.a").unwrap();
        assert_eq!(model.alias_of(ua), Some(ta));
    }

    #[test]
    fn test_unnamed_scope_is_flattened() {
        let input = "$scope module top $end $scope begin $end $var wire 1 ! a $end \
                     $upscope $end $var wire 1 # b $end $upscope $end \
                     $scope module $end $var wire 1 % c $end $upscope $end \
                     $enddefinitions $end";
        let model = load_model(input).unwrap();
        assert!(model.find_net("top.a").is_some());
        assert!(model.find_net("top.b").is_some());
        assert!(model.find_net("c").is_some());
        assert!(model.find_net(".c").is_none());
        let root = model.tree_root();
        assert_eq!(model.child_count(root), 2);
        let top = model.child_at(root, 0).unwrap();
        assert_eq!(model.child_count(top), 2);
        // a flattened scope still needs its `$upscope`
        assert!(matches!(
            load_model("$scope begin $end $upscope $end $upscope $end"),
            Err(VcdParseError::UnbalancedUpscope { .. })
        ));
    }

    #[test]
    fn test_skips_unknown_blocks() {
        let input = "$comment\n some $var text\n$end\n$version 1.0 $end\n$var wire 1 ! a $end\n\
                     $enddefinitions $end\n$comment in body $end\n#5\n1!\n";
        let (calls, stats) = load(input).unwrap();
        assert_eq!(calls, ["net(a, 1)", "0@5 = 1", "finished"]);
        assert_eq!(stats.transitions, 1);
    }

    #[test]
    fn test_time_going_back_is_ignored() {
        let input = "$var wire 1 ! a $end $enddefinitions $end #10 1! #5 0! #20 1!";
        let (calls, _) = load(input).unwrap();
        assert_eq!(calls, ["net(a, 1)", "0@10 = 1", "0@10 = 0", "0@20 = 1", "finished"]);
    }

    #[test]
    fn test_zero_width_var() {
        let (calls, _) = load("$var wire 0 ! a $end $enddefinitions $end").unwrap();
        assert_eq!(calls, ["net(a, 1)", "finished"]);
    }

    #[test]
    fn test_default_timescale() {
        let opts = LoadOptions {
            default_timescale_ns: 1000,
        };
        let mut recorder = Recorder::default();
        VcdLoader::new(&opts)
            .load(
                "$var wire 1 ! a $end $enddefinitions $end #2 1!".as_bytes(),
                &mut recorder,
            )
            .unwrap();
        assert_eq!(recorder.calls[1], "0@2000 = 1");
    }
}
