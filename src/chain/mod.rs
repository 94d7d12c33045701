// Chain linking

mod resolver;

pub use resolver::HeightResolver;
