use core::hash::Hash;
use core::marker::PhantomData;

/// Typed index into an `Arena`.
#[derive(Debug)]
pub struct Id<T> {
    index: u32,
    _phantom: PhantomData<T>,
}
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Id<T> {}
impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index.eq(&other.index)
    }
}
impl<T> Eq for Id<T> {}
impl<T> Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, h: &mut H) {
        self.index.hash(h);
    }
}

/// Append-only storage. Nodes are never removed, so an `Id` handed out by an
/// arena stays valid for the arena's lifetime.
pub struct Arena<T> {
    store: Vec<T>,
}
impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { store: Vec::with_capacity(64) }
    }
    pub fn alloc(&mut self, value: T) -> Id<T> {
        debug_assert!(self.store.len() < u32::MAX as usize);
        let id = Id { index: self.store.len() as u32, _phantom: PhantomData };
        self.store.push(value);
        id
    }
    pub fn len(&self) -> usize {
        self.store.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        (0..).map(|index| Id { index, _phantom: PhantomData }).zip(self.store.iter())
    }
}
impl<T> core::ops::Index<Id<T>> for Arena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &Self::Output {
        &self.store[id.index as usize]
    }
}
impl<T> core::ops::IndexMut<Id<T>> for Arena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut Self::Output {
        &mut self.store[id.index as usize]
    }
}
