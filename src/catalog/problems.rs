use serde_json::json;

use super::{Difficulty, Example, Problem, StarterCode, TestCase};

fn example(input: &str, output: &str, explanation: &str) -> Example {
    Example {
        input: input.to_string(),
        output: output.to_string(),
        explanation: explanation.to_string(),
    }
}

fn case(input: serde_json::Value, expected_output: serde_json::Value) -> TestCase {
    TestCase {
        input,
        expected_output,
    }
}

fn starter(cpp: &str, java: &str, python: &str) -> StarterCode {
    StarterCode {
        cpp: cpp.to_string(),
        java: java.to_string(),
        python: python.to_string(),
    }
}

pub(super) fn builtin() -> Vec<Problem> {
    vec![
        Problem {
            id: "two-sum".into(),
            title: "Two Sum".into(),
            difficulty: Difficulty::Easy,
            description: "Given an array of integers nums and an integer target, return indices of the \
                two numbers such that they add up to target.\n\
                You may assume that each input would have exactly one solution, and you may not use \
                the same element twice.\n\
                You can return the answer in any order."
                .into(),
            examples: vec![example(
                "nums = [2,7,11,15], target = 9",
                "[0,1]",
                "Because nums[0] + nums[1] == 9, we return [0, 1].",
            )],
            test_cases: vec![
                case(json!({ "nums": [2, 7, 11, 15], "target": 9 }), json!([0, 1])),
                case(json!({ "nums": [3, 2, 4], "target": 6 }), json!([1, 2])),
            ],
            starter_code: starter(
                "#include <vector>\nusing namespace std;\nvector<int> twoSum(vector<int>& nums, int target) {\n    // Write your solution here\n    return {};\n}",
                "import java.util.*;\nclass Solution {\n    public int[] twoSum(int[] nums, int target) {\n        // Write your solution here\n        return new int[0];\n    }\n}",
                "def two_sum(nums, target):\n    # Write your solution here\n    return []",
            ),
        },
        Problem {
            id: "palindrome-number".into(),
            title: "Palindrome Number".into(),
            difficulty: Difficulty::Easy,
            description: "Given an integer x, return true if x is a palindrome, and false otherwise.\n\
                An integer is a palindrome when it reads the same forward and backward."
                .into(),
            examples: vec![example(
                "x = 121",
                "true",
                "121 reads as 121 from left to right and from right to left.",
            )],
            test_cases: vec![
                case(json!(121), json!(true)),
                case(json!(-121), json!(false)),
                case(json!(10), json!(false)),
            ],
            starter_code: starter(
                "#include <iostream>\nbool isPalindrome(int x) {\n    // Write your solution here\n    return false;\n}",
                "class Solution {\n    public boolean isPalindrome(int x) {\n        // Write your solution here\n        return false;\n    }\n}",
                "def is_palindrome(x):\n    # Write your solution here\n    return False",
            ),
        },
        Problem {
            id: "longest-substring".into(),
            title: "Longest Substring Without Repeating Characters".into(),
            difficulty: Difficulty::Medium,
            description: "Given a string s, find the length of the longest substring without repeating characters."
                .into(),
            examples: vec![example(
                "s = \"abcabcbb\"",
                "3",
                "The answer is 'abc', with the length of 3.",
            )],
            test_cases: vec![
                case(json!("abcabcbb"), json!(3)),
                case(json!("bbbbb"), json!(1)),
                case(json!("pwwkew"), json!(3)),
            ],
            starter_code: starter(
                "#include <string>\nusing namespace std;\nint lengthOfLongestSubstring(string s) {\n    // Write your solution here\n    return 0;\n}",
                "class Solution {\n    public int lengthOfLongestSubstring(String s) {\n        // Write your solution here\n        return 0;\n    }\n}",
                "def length_of_longest_substring(s):\n    # Write your solution here\n    return 0",
            ),
        },
        Problem {
            id: "merge-k-sorted-lists".into(),
            title: "Merge k Sorted Lists".into(),
            difficulty: Difficulty::Hard,
            description: "You are given an array of k linked-lists lists, each linked-list is sorted in ascending order.\n\
                Merge all the linked-lists into one sorted linked-list and return it."
                .into(),
            examples: vec![example(
                "lists = [[1,4,5],[1,3,4],[2,6]]",
                "[1,1,2,3,4,4,5,6]",
                "The linked-lists are merged in sorted order.",
            )],
            test_cases: vec![
                case(
                    json!([[1, 4, 5], [1, 3, 4], [2, 6]]),
                    json!([1, 1, 2, 3, 4, 4, 5, 6]),
                ),
                case(json!([]), json!([])),
            ],
            starter_code: starter(
                "#include <vector>\nusing namespace std;\nvector<int> mergeKLists(vector<vector<int>>& lists) {\n    // Write your solution here\n    return {};\n}",
                "import java.util.*;\nclass Solution {\n    public ListNode mergeKLists(ListNode[] lists) {\n        // Write your solution here\n        return null;\n    }\n}",
                "def merge_k_lists(lists):\n    # Write your solution here\n    return []",
            ),
        },
    ]
}
