mod helpers;
mod mocks;
mod payments;
mod scan;
mod watches;
