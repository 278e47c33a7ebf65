/// Defines a function returning the value of an environment variable,
/// falling back to a default when it is unset or does not parse.
#[macro_export]
macro_rules! env_default {
	// Case with default value
	($name:ident, $env:expr, $ty:ty, $default:expr) => {
		pub fn $name() -> $ty {
			std::env::var($env).ok().and_then(|v| v.parse().ok()).unwrap_or($default)
		}
	};
	// Case without default value
	($name:ident, $env:expr, $ty:ty) => {
		pub fn $name() -> Option<$ty> {
			std::env::var($env).ok().and_then(|v| v.parse().ok())
		}
	};
}

#[cfg(test)]
mod tests {
	#[test]
	fn test_env_default_with_env() {
		std::env::set_var("GUARD_TEST_ENV_DEFAULT_1", "42");

		env_default!(my_env, "GUARD_TEST_ENV_DEFAULT_1", u64);
		assert_eq!(my_env(), Some(42));

		env_default!(my_env_with_default, "GUARD_TEST_ENV_DEFAULT_1", u64, 0);
		assert_eq!(my_env_with_default(), 42);
	}

	#[test]
	fn test_env_default_unparsable_falls_back() {
		std::env::set_var("GUARD_TEST_ENV_DEFAULT_2", "not a number");

		env_default!(my_env, "GUARD_TEST_ENV_DEFAULT_2", u64, 7);
		assert_eq!(my_env(), 7);

		env_default!(my_optional_env, "GUARD_TEST_ENV_DEFAULT_3", u64);
		assert_eq!(my_optional_env(), None);
	}
}
