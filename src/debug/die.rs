use crate::{
    debug::{Abbreviations, AttributeName, AttributeValue, Encoding, Tag, decode_attribute, decode_u64},
    elf::Stream,
    error::{DwarfError, Result},
};
use indexmap::IndexMap;
use std::fmt;

/// Debugging Information Entry. The entries of a compilation unit form a tree rooted
/// at (typically) a DW_TAG_compile_unit.
///
/// Trees can be as deep as the max_depth the builder was given so Clone, PartialEq,
/// and Drop are all implemented without recursion.
pub struct Die<'a> {
    offset: usize,
    tag: Tag,
    has_children: bool,
    attrs: IndexMap<AttributeName, AttributeValue<'a>>,
    children: Vec<Die<'a>>,
}

impl<'a> Die<'a> {
    /// Offset of the entry within .debug_info.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The abbreviation's children flag. This can be set even if children is empty.
    pub fn has_children(&self) -> bool {
        self.has_children
    }

    pub fn attribute(&self, name: AttributeName) -> Option<&AttributeValue<'a>> {
        self.attrs.get(&name)
    }

    /// In the order they were encoded.
    pub fn attributes(&self) -> impl Iterator<Item = (AttributeName, &AttributeValue<'a>)> {
        self.attrs.iter().map(|(n, v)| (*n, v))
    }

    pub fn num_attributes(&self) -> usize {
        self.attrs.len()
    }

    pub fn children(&self) -> &[Die<'a>] {
        &self.children
    }

    /// DW_AT_name if it's present and a valid string.
    pub fn name(&self) -> Option<&'a str> {
        self.attribute(AttributeName::DW_AT_name)
            .and_then(|v| v.as_str())
    }

    /// Returns the entry (this one or a descendant) that starts at offset. Children are
    /// stored in offset order so this only descends into one child per level.
    pub fn find(&self, offset: usize) -> Option<&Die<'a>> {
        let mut die = self;
        loop {
            if die.offset == offset {
                return Some(die);
            }
            let index = die.children.partition_point(|c| c.offset <= offset);
            if index == 0 {
                return None;
            }
            die = &die.children[index - 1];
        }
    }

    /// Pre-order traversal, the callback is given each entry and its depth (0 for self).
    pub fn walk<F>(&self, mut callback: F)
    where
        F: FnMut(&Die<'a>, usize),
    {
        let mut stack = vec![(self, 0)];
        while let Some((die, depth)) = stack.pop() {
            callback(die, depth);
            for child in die.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    /// Number of entries in the tree, including self.
    pub fn count(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _| count += 1);
        count
    }
}

impl<'a> Die<'a> {
    fn shallow_clone(&self) -> Die<'a> {
        Die {
            offset: self.offset,
            tag: self.tag,
            has_children: self.has_children,
            attrs: self.attrs.clone(),
            children: Vec::with_capacity(self.children.len()),
        }
    }
}

impl Clone for Die<'_> {
    fn clone(&self) -> Self {
        // Same approach as DieBuilder: current is the copy whose children are being
        // filled in, parents are the copies of its ancestors.
        let mut current = self.shallow_clone();
        let mut parents = Vec::new();
        let mut pending = vec![(self, 0)]; // source entry and its next child
        while let Some((source, index)) = pending.pop() {
            match source.children.get(index) {
                Some(child) => {
                    pending.push((source, index + 1));
                    pending.push((child, 0));
                    parents.push(std::mem::replace(&mut current, child.shallow_clone()));
                }
                None => {
                    if let Some(parent) = parents.pop() {
                        let done = std::mem::replace(&mut current, parent);
                        current.children.push(done);
                    }
                }
            }
        }
        current
    }
}

impl PartialEq for Die<'_> {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((lhs, rhs)) = pending.pop() {
            if lhs.offset != rhs.offset
                || lhs.tag != rhs.tag
                || lhs.has_children != rhs.has_children
                || lhs.children.len() != rhs.children.len()
                || lhs.attrs != rhs.attrs
            {
                return false;
            }
            pending.extend(lhs.children.iter().zip(rhs.children.iter()));
        }
        true
    }
}

impl Drop for Die<'_> {
    fn drop(&mut self) {
        // children are emptied before they are dropped so this never nests
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut die) = pending.pop() {
            pending.append(&mut die.children);
        }
    }
}

/// Only the entry itself, use walk to see descendants.
impl fmt::Debug for Die<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Die")
            .field("offset", &self.offset)
            .field("tag", &self.tag)
            .field("has_children", &self.has_children)
            .field("attrs", &self.attrs)
            .field("num_children", &self.children.len())
            .finish()
    }
}

/// Decodes entries using one unit's abbreviations. Nesting is tracked with a heap
/// allocated stack so hostile inputs can't overflow the thread's stack.
pub struct DieBuilder<'u, 'a> {
    abbrevs: &'u Abbreviations,
    strings: &'a [u8],
    encoding: Encoding,
    max_depth: usize,
}

impl<'u, 'a> DieBuilder<'u, 'a> {
    /// max_depth is the most entries with children that can be open at once.
    pub fn new(abbrevs: &'u Abbreviations, strings: &'a [u8], encoding: Encoding, max_depth: usize) -> Self {
        DieBuilder {
            abbrevs,
            strings,
            encoding,
            max_depth,
        }
    }

    /// Reads the entry at the stream's position and all of its descendants. The stream
    /// is left just past the entry's terminating null (or just past the entry if it has
    /// no children).
    pub fn build(&self, stream: &mut Stream<'a>) -> Result<Die<'a>> {
        let start = stream.offset();
        let root = self
            .read_entry(stream)?
            .ok_or(DwarfError::EmptyUnit { offset: start })?;
        if !root.has_children {
            return Ok(root);
        }
        if self.max_depth == 0 {
            return Err(DwarfError::TreeTooDeep {
                offset: start,
                max_depth: self.max_depth,
            });
        }

        // current is the entry whose children are being read, parents are its ancestors
        let mut parents = Vec::new();
        let mut current = root;
        loop {
            let offset = stream.offset();
            match self.read_entry(stream)? {
                Some(die) if die.has_children => {
                    if parents.len() + 2 > self.max_depth {
                        return Err(DwarfError::TreeTooDeep {
                            offset,
                            max_depth: self.max_depth,
                        });
                    }
                    parents.push(std::mem::replace(&mut current, die));
                }
                Some(die) => current.children.push(die),
                None => match parents.pop() {
                    Some(parent) => {
                        let done = std::mem::replace(&mut current, parent);
                        current.children.push(done);
                    }
                    None => return Ok(current),
                },
            }
        }
    }

    /// Returns None for the null entry that ends a sibling list.
    fn read_entry(&self, stream: &mut Stream<'a>) -> Result<Option<Die<'a>>> {
        let offset = stream.offset();
        let code = decode_u64(stream)?;
        if code == 0 {
            return Ok(None);
        }

        let abbrev = self
            .abbrevs
            .get(code)
            .ok_or(DwarfError::UnknownAbbreviationCode { offset, code })?;
        let mut attrs = IndexMap::with_capacity(abbrev.attrs.len());
        for attr in abbrev.attrs.iter() {
            let value = decode_attribute(attr.encoding, stream, self.strings, self.encoding)?;
            attrs.insert(attr.name, value);
        }
        Ok(Some(Die {
            offset,
            tag: abbrev.tag,
            has_children: abbrev.has_children,
            attrs,
            children: Vec::new(),
        }))
    }
}
