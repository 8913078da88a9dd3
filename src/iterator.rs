/// Positional cursor over an ordered collection.
///
/// A fresh cursor is not positioned; one of the `seek*` methods must be called
/// first. `key`, `next` and `prev` require `valid()`.
pub trait DBIterator {
    type Key: ?Sized;

    fn valid(&self) -> bool;

    fn seek_to_first(&mut self);

    fn seek_to_last(&mut self);

    /// Positions at the first entry whose key is not less than `target`.
    fn seek(&mut self, target: &Self::Key);

    fn next(&mut self);

    fn prev(&mut self);

    fn key(&self) -> &Self::Key;
}
