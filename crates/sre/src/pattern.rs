//! The view-object surface (`Pattern`, `Match`, `Scanner`) layered on top of
//! the opcode interpreter in [`crate::engine`]. Mirrors the behaviour of
//! CPython's `SRE_Pattern` / `SRE_Match` / `SRE_Scanner`: this module holds
//! no opcode-dispatch logic of its own, only bookkeeping around repeated
//! `State::search`/`py_match` calls.

use std::collections::HashMap;
use std::fmt;

use pyrt_wtf8::{Wtf8, Wtf8Buf};

use crate::engine::{Request, State};
use crate::SreFlag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for GroupRef<'_> {
    fn from(i: usize) -> Self {
        GroupRef::Index(i)
    }
}

impl<'a> From<&'a str> for GroupRef<'a> {
    fn from(name: &'a str) -> Self {
        GroupRef::Name(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoSuchGroup;

impl fmt::Display for NoSuchGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no such group")
    }
}

impl std::error::Error for NoSuchGroup {}

/// A compiled opcode stream plus the metadata a `Pattern`/`Match` pair needs
/// to resolve named groups. Building the opcode stream itself is out of
/// scope here; callers hand one in fully formed.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub pattern_source: String,
    pub flags: SreFlag,
    pub code: Vec<u32>,
    pub groups: usize,
    pub groupindex: HashMap<String, usize>,
    pub indexgroup: Vec<Option<String>>,
}

impl Pattern {
    pub fn new(
        pattern_source: impl Into<String>,
        flags: SreFlag,
        code: Vec<u32>,
        groups: usize,
        groupindex: HashMap<String, usize>,
        indexgroup: Vec<Option<String>>,
    ) -> Self {
        Self {
            pattern_source: pattern_source.into(),
            flags,
            code,
            groups,
            groupindex,
            indexgroup,
        }
    }

    fn resolve_group(&self, group: GroupRef<'_>) -> Result<usize, NoSuchGroup> {
        match group {
            GroupRef::Index(i) if i <= self.groups => Ok(i),
            GroupRef::Name(name) => self.groupindex.get(name).copied().ok_or(NoSuchGroup),
            GroupRef::Index(_) => Err(NoSuchGroup),
        }
    }

    /// `match(target, pos, endpos)`: attempt a match anchored at exactly `pos`.
    pub fn match_at<'p>(
        &'p self,
        target: &'p Wtf8,
        pos: usize,
        endpos: usize,
    ) -> Option<Match<'p>> {
        let req = Request::new(target, pos, endpos, &self.code, false);
        let mut state = State::default();
        if state.py_match(&req) {
            Some(Match::new(self, target, pos, endpos, state))
        } else {
            None
        }
    }

    /// `fullmatch(target, pos, endpos)`: `match_at` plus a check that the
    /// match spans the whole requested range.
    pub fn fullmatch<'p>(
        &'p self,
        target: &'p Wtf8,
        pos: usize,
        endpos: usize,
    ) -> Option<Match<'p>> {
        let m = self.match_at(target, pos, endpos)?;
        let end = endpos.min(target.char_len());
        if m.start(0).unwrap() == pos as isize && m.end(0).unwrap() == end as isize {
            Some(m)
        } else {
            None
        }
    }

    /// `search(target, pos, endpos)`: scan forward from `pos` for the first match.
    pub fn search<'p>(&'p self, target: &'p Wtf8, pos: usize, endpos: usize) -> Option<Match<'p>> {
        let req = Request::new(target, pos, endpos, &self.code, false);
        let mut state = State::default();
        if state.search(req) {
            Some(Match::new(self, target, pos, endpos, state))
        } else {
            None
        }
    }

    pub fn scanner<'p>(
        &'p self,
        target: &'p Wtf8,
        pos: usize,
        endpos: usize,
    ) -> Scanner<'p> {
        Scanner {
            pattern: self,
            target,
            pos,
            endpos,
        }
    }

    /// `findall`: one item per non-overlapping match, either the single group
    /// capture (0 or 1 explicit groups) or a tuple-like `Vec` of all groups.
    pub fn findall(&self, target: &Wtf8, pos: usize, endpos: usize) -> Vec<FindallItem> {
        let mut out = Vec::new();
        let mut start = pos;
        let end = endpos.min(target.char_len());
        while start <= end {
            let Some(m) = self.search(target, start, end) else {
                break;
            };
            let item = if self.groups == 0 {
                FindallItem::Single(m.group(GroupRef::Index(0)).unwrap())
            } else if self.groups == 1 {
                FindallItem::Single(m.group(GroupRef::Index(1)).unwrap())
            } else {
                FindallItem::Tuple(
                    (1..=self.groups)
                        .map(|g| m.group(GroupRef::Index(g)).unwrap())
                        .collect(),
                )
            };
            out.push(item);
            let match_start = m.start(0).unwrap() as usize;
            let match_end = m.end(0).unwrap() as usize;
            start = if match_end == match_start { match_start + 1 } else { match_end };
        }
        out
    }

    /// `finditer`: the iterator form of `findall`, yielding full `Match`es.
    pub fn finditer<'p>(
        &'p self,
        target: &'p Wtf8,
        pos: usize,
        endpos: usize,
    ) -> FindIter<'p> {
        FindIter {
            pattern: self,
            target,
            pos,
            endpos,
            done: false,
        }
    }

    /// `split(target, maxsplit)`.
    pub fn split(&self, target: &Wtf8, maxsplit: usize) -> Vec<Option<Wtf8Buf>> {
        let mut out = Vec::new();
        let end = target.char_len();
        let mut n = 0usize;
        let mut last = 0usize;
        let mut start = 0usize;
        loop {
            if maxsplit != 0 && n >= maxsplit {
                break;
            }
            let Some(m) = self.search(target, start, end) else {
                break;
            };
            let match_start = m.start(0).unwrap() as usize;
            let match_end = m.end(0).unwrap() as usize;
            if match_start == match_end {
                // zero-width match
                if last == end {
                    break;
                }
                start = match_start + 1;
                continue;
            }
            out.push(Some(slice_owned(target, last, match_start)));
            if self.groups > 0 {
                for g in 1..=self.groups {
                    out.push(m.group(GroupRef::Index(g)).unwrap());
                }
            }
            n += 1;
            last = match_end;
            start = match_end;
        }
        out.push(Some(slice_owned(target, last, end)));
        out
    }

    /// `sub`/`subn`: literal or callback replacement, walking the same path
    /// as `split`/`findall`. `repl` receives each `Match` and returns its
    /// replacement text.
    pub fn subn(
        &self,
        mut repl: impl FnMut(&Match<'_>) -> Wtf8Buf,
        target: &Wtf8,
        count: usize,
    ) -> (Wtf8Buf, usize) {
        let end = target.char_len();
        let mut out = Wtf8Buf::new();
        let mut n = 0usize;
        let mut last_pos = 0usize;
        let mut start = 0usize;
        loop {
            if count != 0 && n >= count {
                break;
            }
            let Some(m) = self.search(target, start, end) else {
                break;
            };
            let match_start = m.start(0).unwrap() as usize;
            let match_end = m.end(0).unwrap() as usize;
            if last_pos < match_start {
                out.push_wtf8(&slice_owned(target, last_pos, match_start));
            }
            if !(last_pos == match_start && last_pos == match_end && n > 0) {
                out.push_wtf8(&repl(&m));
                last_pos = match_end;
                n += 1;
            }
            start = if match_end == match_start {
                match_start + 1
            } else {
                match_end
            };
        }
        if last_pos < end {
            out.push_wtf8(&slice_owned(target, last_pos, end));
        }
        (out, n)
    }

    pub fn sub(&self, repl: impl FnMut(&Match<'_>) -> Wtf8Buf, target: &Wtf8, count: usize) -> Wtf8Buf {
        self.subn(repl, target, count).0
    }
}

pub enum FindallItem {
    Single(Option<Wtf8Buf>),
    Tuple(Vec<Option<Wtf8Buf>>),
}

pub struct FindIter<'p> {
    pattern: &'p Pattern,
    target: &'p Wtf8,
    pos: usize,
    endpos: usize,
    done: bool,
}

impl<'p> Iterator for FindIter<'p> {
    type Item = Match<'p>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos > self.endpos {
            return None;
        }
        let m = self.pattern.search(self.target, self.pos, self.endpos)?;
        let match_start = m.start(0).unwrap() as usize;
        let match_end = m.end(0).unwrap() as usize;
        if match_end == match_start {
            self.pos = match_start + 1;
        } else {
            self.pos = match_end;
        }
        if self.pos > self.target.char_len() {
            self.done = true;
        }
        Some(m)
    }
}

/// Undocumented-in-CPython-docs but widely relied upon `re.Scanner` helper:
/// `match`/`search` each advance a shared cursor, whichever succeeds.
pub struct Scanner<'p> {
    pattern: &'p Pattern,
    target: &'p Wtf8,
    pos: usize,
    endpos: usize,
}

impl<'p> Scanner<'p> {
    fn advance(&mut self, m: Option<Match<'p>>) -> Option<Match<'p>> {
        match &m {
            Some(m) => {
                let match_start = m.start(0).unwrap() as usize;
                let match_end = m.end(0).unwrap() as usize;
                self.pos = if match_end == match_start {
                    match_start + 1
                } else {
                    match_end
                };
            }
            None => self.pos += 1,
        }
        m
    }

    pub fn match_next(&mut self) -> Option<Match<'p>> {
        let m = self.pattern.match_at(self.target, self.pos, self.endpos);
        self.advance(m)
    }

    pub fn search_next(&mut self) -> Option<Match<'p>> {
        let m = self.pattern.search(self.target, self.pos, self.endpos);
        self.advance(m)
    }
}

fn char_to_byte(s: &Wtf8, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }
    match s.code_point_indices().nth(char_index) {
        Some((byte, _)) => byte,
        None => s.len(),
    }
}

fn slice_owned(s: &Wtf8, start: usize, end: usize) -> Wtf8Buf {
    let start_b = char_to_byte(s, start);
    let end_b = char_to_byte(s, end);
    Wtf8Buf::from(&s[start_b..end_b])
}

/// A successful match: group spans plus enough of the originating pattern to
/// resolve group names. `start`/`end` return char offsets using the `-1`
/// sentinel for a group that didn't participate, the same convention as
/// CPython's `MatchObject`.
pub struct Match<'p> {
    pattern: &'p Pattern,
    string: &'p Wtf8,
    pub pos: usize,
    pub endpos: usize,
    regs: Vec<(isize, isize)>,
    pub lastindex: isize,
    pub lastgroup: Option<String>,
}

impl<'p> Match<'p> {
    fn new(pattern: &'p Pattern, string: &'p Wtf8, pos: usize, endpos: usize, state: State) -> Self {
        let mut regs = Vec::with_capacity(pattern.groups + 1);
        regs.push((state.start as isize, state.cursor.position as isize));
        for group in 0..pattern.groups {
            let (gs, ge) = state.marks.get(group);
            if gs.is_some() && ge.is_some() {
                regs.push((gs.unpack() as isize, ge.unpack() as isize));
            } else {
                regs.push((-1, -1));
            }
        }
        let lastindex = state.marks.last_index();
        let lastgroup = if lastindex >= 1 {
            pattern
                .indexgroup
                .get(lastindex as usize - 1)
                .cloned()
                .flatten()
        } else {
            None
        };
        Self {
            pattern,
            string,
            pos,
            endpos,
            regs,
            lastindex,
            lastgroup,
        }
    }

    pub fn re(&self) -> &'p Pattern {
        self.pattern
    }

    pub fn string(&self) -> &'p Wtf8 {
        self.string
    }

    /// `(start, end)` char offsets for every group, including group 0, in
    /// declaration order. Unmatched groups read `(-1, -1)`.
    pub fn regs(&self) -> &[(isize, isize)] {
        &self.regs
    }

    fn bounds(&self, group: GroupRef<'_>) -> Result<(isize, isize), NoSuchGroup> {
        let index = self.pattern.resolve_group(group)?;
        Ok(self.regs[index])
    }

    pub fn start<'g>(&self, group: impl Into<GroupRef<'g>>) -> Result<isize, NoSuchGroup> {
        Ok(self.bounds(group.into())?.0)
    }

    pub fn end<'g>(&self, group: impl Into<GroupRef<'g>>) -> Result<isize, NoSuchGroup> {
        Ok(self.bounds(group.into())?.1)
    }

    pub fn span<'g>(&self, group: impl Into<GroupRef<'g>>) -> Result<(isize, isize), NoSuchGroup> {
        self.bounds(group.into())
    }

    fn slice(&self, group: GroupRef<'_>) -> Result<Option<Wtf8Buf>, NoSuchGroup> {
        let (start, end) = self.bounds(group)?;
        if start < 0 {
            return Ok(None);
        }
        Ok(Some(slice_owned(self.string, start as usize, end as usize)))
    }

    pub fn group<'g>(&self, group: impl Into<GroupRef<'g>>) -> Result<Option<Wtf8Buf>, NoSuchGroup> {
        self.slice(group.into())
    }

    pub fn groups(&self, default: Option<&Wtf8Buf>) -> Vec<Option<Wtf8Buf>> {
        (1..self.regs.len())
            .map(|i| {
                self.slice(GroupRef::Index(i))
                    .unwrap()
                    .or_else(|| default.cloned())
            })
            .collect()
    }

    pub fn groupdict(&self, default: Option<&Wtf8Buf>) -> HashMap<String, Option<Wtf8Buf>> {
        self.pattern
            .groupindex
            .iter()
            .map(|(name, &index)| {
                let value = self
                    .slice(GroupRef::Index(index))
                    .unwrap()
                    .or_else(|| default.cloned());
                (name.clone(), value)
            })
            .collect()
    }

    /// Resolves `\g<name>`, `\g<N>`, and bare `\N` backreferences in `template`.
    pub fn expand(&self, template: &Wtf8) -> Wtf8Buf {
        let mut out = Wtf8Buf::new();
        let chars: Vec<_> = template.code_points().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.to_char() == Some('\\') && i + 1 < chars.len() {
                let mut j = i + 1;
                if chars[j].to_char() == Some('g') && j + 1 < chars.len() && chars[j + 1].to_char() == Some('<') {
                    let name_start = j + 2;
                    let mut k = name_start;
                    while k < chars.len() && chars[k].to_char() != Some('>') {
                        k += 1;
                    }
                    let name: String = chars[name_start..k].iter().filter_map(|c| c.to_char()).collect();
                    let resolved = match name.parse::<usize>() {
                        Ok(n) => self.group(GroupRef::Index(n)),
                        Err(_) => self.group(GroupRef::Name(&name)),
                    };
                    if let Ok(Some(text)) = resolved {
                        out.push_wtf8(&text);
                    }
                    i = k + 1;
                    continue;
                }
                if let Some(d) = chars[j].to_char().and_then(|c| c.to_digit(10)) {
                    let mut num = d as usize;
                    j += 1;
                    if j < chars.len() {
                        if let Some(d2) = chars[j].to_char().and_then(|c| c.to_digit(10)) {
                            num = num * 10 + d2 as usize;
                            j += 1;
                        }
                    }
                    if let Ok(Some(text)) = self.group(GroupRef::Index(num)) {
                        out.push_wtf8(&text);
                    }
                    i = j;
                    continue;
                }
            }
            out.push(c);
            i += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_bounds_sentinel_for_unmatched_group() {
        // LITERAL 'a', SUCCESS: one declared group, never marked
        let code = vec![
            crate::SreOpcode::LITERAL as u32,
            'a' as u32,
            crate::SreOpcode::SUCCESS as u32,
        ];
        let pattern = Pattern::new("a", SreFlag::default(), code, 1, HashMap::new(), vec![None]);
        let target = Wtf8::from_str("a");
        let m = pattern.match_at(target, 0, 1).unwrap();
        assert_eq!(m.span(0).unwrap(), (0, 1));
        assert_eq!(m.span(1).unwrap(), (-1, -1));
        assert!(m.group(1).unwrap().is_none());
    }

    #[test]
    fn unknown_group_name_errors() {
        let code = vec![crate::SreOpcode::SUCCESS as u32];
        let pattern = Pattern::new("", SreFlag::default(), code, 0, HashMap::new(), vec![None]);
        let target = Wtf8::from_str("");
        let m = pattern.match_at(target, 0, 0).unwrap();
        assert_eq!(m.start("nope"), Err(NoSuchGroup));
    }

    fn word_boundary_pattern() -> Pattern {
        let code = vec![
            crate::SreOpcode::AT as u32,
            crate::SreAtCode::BOUNDARY as u32,
            crate::SreOpcode::SUCCESS as u32,
        ];
        Pattern::new(r"\b", SreFlag::default(), code, 0, HashMap::new(), vec![None])
    }

    #[test]
    fn findall_does_not_double_count_zero_width_boundary_matches() {
        // "ab cd" has word boundaries at 0, 2, 3, 5 — four, not six.
        let pattern = word_boundary_pattern();
        let target = Wtf8::from_str("ab cd");
        let out = pattern.findall(target, 0, target.char_len());
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn finditer_does_not_double_count_zero_width_boundary_matches() {
        let pattern = word_boundary_pattern();
        let target = Wtf8::from_str("ab cd");
        let count = pattern.finditer(target, 0, target.char_len()).count();
        assert_eq!(count, 4);
    }
}
