pub mod activation;

pub use activation::{
    elu, relu, sigmoid, sigmoid_prime, softmax, swish, tanh, ActivationFunction,
};
